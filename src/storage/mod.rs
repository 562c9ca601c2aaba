//! Storage-layer RPC seam.
//!
//! The query core never talks to storage directly; storage-backed leaf
//! executors go through this trait. Real clients issue RPCs against the
//! storage service and may retry internally; the query core only sees the
//! final `Status`. Failures such as `LeaderChanged` propagate unchanged so
//! the error-mapping layer can account for them.

use async_trait::async_trait;

use crate::core::{DataSet, GraphResult};

/// Asynchronous client for the storage service.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Fetch the neighbor rows for the vertices in `input` within `space`.
    async fn get_neighbors(&self, space: &str, input: DataSet) -> GraphResult<DataSet>;
}
