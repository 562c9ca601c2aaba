//! Loop-condition executor.

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::{GraphResult, Status, Value};
use crate::expression::ExpressionEvaluator;
use crate::query::context::QueryContext;
use crate::query::planner::plan::NodeId;

use super::super::base::{BaseExecutor, Executor};
use super::select::VarStoreContext;

/// Evaluates the Loop condition and publishes the boolean outcome under the
/// Loop's output variable. The scheduler re-runs this executor before every
/// iteration and dispatches the body subgraph while the outcome holds.
pub struct LoopExecutor {
    base: BaseExecutor,
}

impl LoopExecutor {
    pub fn new(node_id: NodeId, qctx: Arc<QueryContext>) -> Self {
        Self {
            base: BaseExecutor::new("LoopExecutor", node_id, qctx),
        }
    }
}

#[async_trait]
impl Executor for LoopExecutor {
    async fn execute(&mut self) -> GraphResult<()> {
        let node = self.base.node()?;
        let condition = node
            .condition()
            .ok_or_else(|| Status::error(format!("Loop node {} has no condition", node.id())))?;

        let ctx = VarStoreContext {
            qctx: self.base.qctx(),
        };
        let value = ExpressionEvaluator::evaluate(condition, &ctx)?;
        let proceed = value.as_bool().ok_or_else(|| {
            Status::error(format!(
                "Loop condition must evaluate to a boolean, got {}",
                value.type_name()
            ))
        })?;

        self.base.finish(Value::Bool(proceed))
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
