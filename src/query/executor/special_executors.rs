//! Start, PassThrough and Argument executors.

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::{DataSet, GraphResult, Status, Value};
use crate::query::context::QueryContext;
use crate::query::planner::plan::{NodeBody, NodeId};

use super::base::{BaseExecutor, Executor};

/// Roots a DAG or a loop body; emits an empty dataset so downstream
/// single-input nodes always find their input variable bound.
pub struct StartExecutor {
    base: BaseExecutor,
}

impl StartExecutor {
    pub fn new(node_id: NodeId, qctx: Arc<QueryContext>) -> Self {
        Self {
            base: BaseExecutor::new("StartExecutor", node_id, qctx),
        }
    }
}

#[async_trait]
impl Executor for StartExecutor {
    async fn execute(&mut self) -> GraphResult<()> {
        self.base.finish(Value::DataSet(DataSet::new()))
    }

    fn id(&self) -> i64 {
        self.base.node_id().0 as i64
    }

    fn name(&self) -> &str {
        self.base.name()
    }

    fn node_id(&self) -> NodeId {
        self.base.node_id()
    }
}

/// Identity; forwards the input value under its own output variable. Used
/// as the deterministic join point where diverging branches converge.
pub struct PassThroughExecutor {
    base: BaseExecutor,
}

impl PassThroughExecutor {
    pub fn new(node_id: NodeId, qctx: Arc<QueryContext>) -> Self {
        Self {
            base: BaseExecutor::new("PassThroughExecutor", node_id, qctx),
        }
    }
}

#[async_trait]
impl Executor for PassThroughExecutor {
    async fn execute(&mut self) -> GraphResult<()> {
        let node = self.base.node()?;
        let input = node
            .input()
            .ok_or_else(|| Status::error(format!("PassThrough node {} has no input", node.id())))?;
        let input_node = self.base.qctx().node(input)?;

        // When the node reuses its input's variable name there is nothing
        // to forward.
        if input_node.output_var() == node.output_var() {
            return Ok(());
        }

        let value = self.base.input_value()?;
        self.base.finish(value)
    }

    fn id(&self) -> i64 {
        self.base.node_id().0 as i64
    }

    fn name(&self) -> &str {
        self.base.name()
    }

    fn node_id(&self) -> NodeId {
        self.base.node_id()
    }
}

/// Reads the alias bound by an enclosing context (a Loop iteration value or
/// a correlated parameter) and republishes it as its own output.
pub struct ArgumentExecutor {
    base: BaseExecutor,
}

impl ArgumentExecutor {
    pub fn new(node_id: NodeId, qctx: Arc<QueryContext>) -> Self {
        Self {
            base: BaseExecutor::new("ArgumentExecutor", node_id, qctx),
        }
    }
}

#[async_trait]
impl Executor for ArgumentExecutor {
    async fn execute(&mut self) -> GraphResult<()> {
        let node = self.base.node()?;
        let alias = match node.body() {
            NodeBody::Argument { alias } => alias.clone(),
            other => {
                return Err(Status::error(format!(
                    "ArgumentExecutor dispatched on {} node {}",
                    other.kind().name(),
                    node.id()
                )));
            }
        };

        let value = self
            .base
            .qctx()
            .ectx()
            .get_value(&alias)
            .map_err(|_| Status::error(format!("Argument alias `{}` is not bound", alias)))?;
        self.base.finish(value)
    }

    fn id(&self) -> i64 {
        self.base.node_id().0 as i64
    }

    fn name(&self) -> &str {
        self.base.name()
    }

    fn node_id(&self) -> NodeId {
        self.base.node_id()
    }
}
