//! Conditional-branch executor.

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::{GraphResult, Status, Value};
use crate::expression::{ExpressionContext, ExpressionEvaluator};
use crate::query::context::QueryContext;
use crate::query::planner::plan::NodeId;

use super::super::base::{BaseExecutor, Executor};

/// Resolves variable references against the query's variable store.
pub(crate) struct VarStoreContext<'a> {
    pub qctx: &'a QueryContext,
}

impl ExpressionContext for VarStoreContext<'_> {
    fn variable(&self, name: &str) -> Option<Value> {
        self.qctx.ectx().get_value(name).ok()
    }
}

/// Evaluates the Select condition over its input and publishes the boolean
/// outcome under the Select's output variable. Which branch subgraph gets
/// dispatched is the scheduler's call.
pub struct SelectExecutor {
    base: BaseExecutor,
}

impl SelectExecutor {
    pub fn new(node_id: NodeId, qctx: Arc<QueryContext>) -> Self {
        Self {
            base: BaseExecutor::new("SelectExecutor", node_id, qctx),
        }
    }
}

#[async_trait]
impl Executor for SelectExecutor {
    async fn execute(&mut self) -> GraphResult<()> {
        let node = self.base.node()?;
        let condition = node
            .condition()
            .ok_or_else(|| Status::error(format!("Select node {} has no condition", node.id())))?;

        let ctx = VarStoreContext {
            qctx: self.base.qctx(),
        };
        let value = ExpressionEvaluator::evaluate(condition, &ctx)?;
        let chosen = value.as_bool().ok_or_else(|| {
            Status::error(format!(
                "Select condition must evaluate to a boolean, got {}",
                value.type_name()
            ))
        })?;

        self.base.finish(Value::Bool(chosen))
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
