//! Request entry point.
//!
//! The engine holds the process-wide collaborators (configuration, metrics,
//! the optimizer, the storage client) and stamps out one query context plus
//! one query instance per request.

use std::sync::Arc;

use crate::api::response::ExecutionResponse;
use crate::api::session::ClientSession;
use crate::config::Config;
use crate::query::context::{QueryContext, RequestContext};
use crate::query::optimizer::Optimizer;
use crate::stats::StatsManager;
use crate::storage::StorageClient;
use crate::utils::IdGenerator;

use super::query_instance::QueryInstance;

pub struct QueryEngine {
    config: Arc<Config>,
    stats: Arc<StatsManager>,
    optimizer: Arc<Optimizer>,
    storage: Option<Arc<dyn StorageClient>>,
    query_id_gen: IdGenerator,
}

impl QueryEngine {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            stats: Arc::new(StatsManager::new()),
            optimizer: Arc::new(Optimizer::default()),
            storage: None,
            query_id_gen: IdGenerator::new(1),
        }
    }

    pub fn with_stats(mut self, stats: Arc<StatsManager>) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_optimizer(mut self, optimizer: Arc<Optimizer>) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_storage(mut self, storage: Arc<dyn StorageClient>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn stats(&self) -> &Arc<StatsManager> {
        &self.stats
    }

    /// Run one query for `session` and return the filled response.
    pub async fn execute(&self, query: String, session: Arc<ClientSession>) -> ExecutionResponse {
        let rctx = Arc::new(RequestContext::new(
            self.query_id_gen.id(),
            query,
            session,
        ));

        let mut qctx = QueryContext::new(rctx.clone(), self.config.clone(), self.stats.clone());
        if let Some(storage) = &self.storage {
            qctx = qctx.with_storage(storage.clone());
        }

        let instance = QueryInstance::new(Arc::new(qctx), self.optimizer.clone());
        instance.execute().await;

        rctx.take_response()
    }
}
