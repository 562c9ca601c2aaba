//! Shared fixtures for the integration tests: sessions, engines, mock
//! storage clients and plan-building helpers.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use graph_query_service::api::session::{ClientSession, Session, SpaceInfo};
use graph_query_service::api::service::QueryEngine;
use graph_query_service::config::Config;
use graph_query_service::core::{DataSet, GraphResult, Row, Status, Value};
use graph_query_service::expression::Expression;
use graph_query_service::query::context::{QueryContext, RequestContext};
use graph_query_service::query::planner::plan::{NodeId, ProjectColumn};
use graph_query_service::stats::StatsManager;
use graph_query_service::storage::StorageClient;

pub fn new_session(session_id: i64) -> Arc<ClientSession> {
    ClientSession::new(Session {
        session_id,
        user_name: "root".to_string(),
        timezone: None,
    })
}

pub fn new_session_with_space(session_id: i64, space: &str) -> Arc<ClientSession> {
    let session = new_session(session_id);
    session.set_space(SpaceInfo {
        name: space.to_string(),
        id: 1,
    });
    session
}

pub fn new_engine() -> QueryEngine {
    QueryEngine::new(Arc::new(Config::default()))
}

pub fn new_engine_with_config(config: Config) -> QueryEngine {
    QueryEngine::new(Arc::new(config))
}

/// Query context wired up for direct scheduler-level tests.
pub fn new_query_context(query: &str, session: Arc<ClientSession>) -> Arc<QueryContext> {
    let rctx = Arc::new(RequestContext::new(1, query.to_string(), session));
    Arc::new(QueryContext::new(
        rctx,
        Arc::new(Config::default()),
        Arc::new(StatsManager::new()),
    ))
}

pub fn new_query_context_with_storage(
    query: &str,
    session: Arc<ClientSession>,
    storage: Arc<dyn StorageClient>,
) -> Arc<QueryContext> {
    let rctx = Arc::new(RequestContext::new(1, query.to_string(), session));
    Arc::new(
        QueryContext::new(
            rctx,
            Arc::new(Config::default()),
            Arc::new(StatsManager::new()),
        )
        .with_storage(storage),
    )
}

pub fn int_column(value: i64, alias: &str) -> ProjectColumn {
    ProjectColumn {
        expr: Expression::literal(value),
        alias: alias.to_string(),
    }
}

pub fn single_column_dataset(col: &str, values: &[i64]) -> DataSet {
    let mut ds = DataSet::with_col_names(vec![col.to_string()]);
    for v in values {
        ds.push(Row::from(vec![Value::Int(*v)]));
    }
    ds
}

pub fn output_var(qctx: &QueryContext, id: NodeId) -> String {
    qctx.node(id)
        .expect("plan node exists")
        .output_var()
        .to_string()
}

/// Storage client answering every request with a fixed dataset, counting
/// calls as it goes.
pub struct CountingStorage {
    pub calls: AtomicUsize,
    response: DataSet,
}

impl CountingStorage {
    pub fn new(response: DataSet) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            response,
        })
    }

    pub fn num_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageClient for CountingStorage {
    async fn get_neighbors(&self, _space: &str, _input: DataSet) -> GraphResult<DataSet> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}

/// Storage client failing every request with a fixed status after an
/// optional delay.
pub struct FailingStorage {
    status: Status,
    delay: Duration,
}

impl FailingStorage {
    pub fn new(status: Status) -> Arc<Self> {
        Arc::new(Self {
            status,
            delay: Duration::ZERO,
        })
    }

    pub fn with_delay(status: Status, delay: Duration) -> Arc<Self> {
        Arc::new(Self { status, delay })
    }
}

#[async_trait]
impl StorageClient for FailingStorage {
    async fn get_neighbors(&self, _space: &str, _input: DataSet) -> GraphResult<DataSet> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Err(self.status.clone())
    }
}

/// Storage client whose answer depends on the requested space; lets one
/// plan mix fast failures, slow failures and successes.
pub struct SpaceKeyedStorage {
    behaviors: std::collections::HashMap<String, (Duration, GraphResult<DataSet>)>,
}

impl SpaceKeyedStorage {
    pub fn new() -> Self {
        Self {
            behaviors: std::collections::HashMap::new(),
        }
    }

    pub fn on(mut self, space: &str, delay: Duration, result: GraphResult<DataSet>) -> Self {
        self.behaviors.insert(space.to_string(), (delay, result));
        self
    }

    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl StorageClient for SpaceKeyedStorage {
    async fn get_neighbors(&self, space: &str, _input: DataSet) -> GraphResult<DataSet> {
        match self.behaviors.get(space) {
            Some((delay, result)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(*delay).await;
                }
                result.clone()
            }
            None => Err(Status::SpaceNotFound(space.to_string())),
        }
    }
}
