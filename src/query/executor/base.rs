//! Executor trait and shared executor state.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

use crate::core::{GraphResult, Status, Value};
use crate::query::context::QueryContext;
use crate::query::planner::plan::{NodeId, PlanNode, ProfileStats};

/// A single plan-node execution.
///
/// Executors are created per dispatch by the factory, borrow the query
/// context through its `Arc` and must not outlive it. `execute()` resolves
/// when the node's work is done and its output variable is published.
#[async_trait]
pub trait Executor: Send {
    async fn execute(&mut self) -> GraphResult<()>;

    fn id(&self) -> i64;

    fn name(&self) -> &str;

    fn node_id(&self) -> NodeId;
}

/// Common state and helpers shared by every executor.
pub struct BaseExecutor {
    node_id: NodeId,
    name: &'static str,
    qctx: Arc<QueryContext>,
    started: Instant,
}

impl BaseExecutor {
    pub fn new(name: &'static str, node_id: NodeId, qctx: Arc<QueryContext>) -> Self {
        Self {
            node_id,
            name,
            qctx,
            started: Instant::now(),
        }
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn qctx(&self) -> &Arc<QueryContext> {
        &self.qctx
    }

    /// Snapshot of the plan node this executor runs.
    pub fn node(&self) -> GraphResult<PlanNode> {
        self.qctx.node(self.node_id)
    }

    /// Read the output of the node's first data-dependency input.
    pub fn input_value(&self) -> GraphResult<Value> {
        let node = self.node()?;
        let input = node.input().ok_or_else(|| {
            Status::error(format!("{} node {} has no input", node.kind().name(), node.id()))
        })?;
        let input_node = self.qctx.node(input)?;
        self.qctx.ectx().get_value(input_node.output_var())
    }

    /// Publish `value` as this node's output and record profiling stats.
    /// Re-execution inside a loop body appends a fresh version.
    pub fn finish(&self, value: Value) -> GraphResult<()> {
        let node = self.node()?;
        let rows = value.as_dataset().map(|ds| ds.num_rows()).unwrap_or(0);
        self.qctx.ectx().publish(node.output_var(), value);
        self.qctx.add_profile(
            self.node_id,
            ProfileStats {
                rows,
                exec_duration_us: self.started.elapsed().as_micros() as u64,
            },
        );
        Ok(())
    }
}
