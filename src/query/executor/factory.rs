//! Executor factory.
//!
//! Pure lookup from plan-node kind to executor constructor. Direct match,
//! no registration machinery: the kind set is closed per build and both the
//! scheduler and this factory dispatch on the same tag.

use std::sync::Arc;

use crate::core::GraphResult;
use crate::query::context::QueryContext;
use crate::query::planner::plan::{NodeId, PlanNodeKind};

use super::base::Executor;
use super::data_access::GetNeighborsExecutor;
use super::logic::{LoopExecutor, SelectExecutor};
use super::result_processing::{FilterExecutor, LimitExecutor, ProjectExecutor};
use super::special_executors::{ArgumentExecutor, PassThroughExecutor, StartExecutor};

pub struct ExecutorFactory;

impl ExecutorFactory {
    /// Build the executor for `node_id`. The executor borrows the query
    /// context through the `Arc` and must not outlive it.
    pub fn make_executor(
        qctx: &Arc<QueryContext>,
        node_id: NodeId,
    ) -> GraphResult<Box<dyn Executor>> {
        let kind = qctx.node(node_id)?.kind();
        let executor: Box<dyn Executor> = match kind {
            PlanNodeKind::Start => Box::new(StartExecutor::new(node_id, qctx.clone())),
            PlanNodeKind::Select => Box::new(SelectExecutor::new(node_id, qctx.clone())),
            PlanNodeKind::Loop => Box::new(LoopExecutor::new(node_id, qctx.clone())),
            PlanNodeKind::PassThrough => Box::new(PassThroughExecutor::new(node_id, qctx.clone())),
            PlanNodeKind::Argument => Box::new(ArgumentExecutor::new(node_id, qctx.clone())),
            PlanNodeKind::Project => Box::new(ProjectExecutor::new(node_id, qctx.clone())),
            PlanNodeKind::Filter => Box::new(FilterExecutor::new(node_id, qctx.clone())),
            PlanNodeKind::Limit => Box::new(LimitExecutor::new(node_id, qctx.clone())),
            PlanNodeKind::GetNeighbors => {
                Box::new(GetNeighborsExecutor::new(node_id, qctx.clone()))
            }
        };
        Ok(executor)
    }
}
