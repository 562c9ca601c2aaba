//! Storage-backed leaf executors.

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::{GraphResult, Status, Value};
use crate::query::context::QueryContext;
use crate::query::planner::plan::{NodeBody, NodeId};

use super::base::{BaseExecutor, Executor};

/// Expands the neighbors of the input vertices through the storage client.
/// The RPC itself (batching, retries, routing) is the client's concern;
/// failures such as a leader change surface here as plain statuses.
pub struct GetNeighborsExecutor {
    base: BaseExecutor,
}

impl GetNeighborsExecutor {
    pub fn new(node_id: NodeId, qctx: Arc<QueryContext>) -> Self {
        Self {
            base: BaseExecutor::new("GetNeighborsExecutor", node_id, qctx),
        }
    }
}

#[async_trait]
impl Executor for GetNeighborsExecutor {
    async fn execute(&mut self) -> GraphResult<()> {
        let node = self.base.node()?;
        let space = match node.body() {
            NodeBody::GetNeighbors { space } => space.clone(),
            other => {
                return Err(Status::error(format!(
                    "GetNeighborsExecutor dispatched on {} node {}",
                    other.kind().name(),
                    node.id()
                )));
            }
        };

        let input = self.base.input_value()?;
        let input_ds = input.into_dataset().ok_or_else(|| {
            Status::error(format!(
                "GetNeighbors node {} input is not a dataset",
                node.id()
            ))
        })?;

        let storage = self.base.qctx().storage_client()?.clone();
        let result = storage.get_neighbors(&space, input_ds).await?;
        self.base.finish(Value::DataSet(result))
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
