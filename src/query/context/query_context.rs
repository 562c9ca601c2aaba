//! Per-query context: the ownership root for everything a single request
//! allocates.
//!
//! The query context owns the plan arena, the executable plan, the variable
//! store and the kill flag, and carries shared handles to the request
//! context, configuration, metrics and the storage client. It is shared as
//! an `Arc` between the query instance, the scheduler and every spawned
//! executor task; all of those drop their handles by the time the instance
//! reaches a terminal transition, so the context (and with it every
//! arena-owned plan node) is released exactly once.

use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::Config;
use crate::core::{GraphResult, Status};
use crate::query::context::execution_context::ExecutionContext;
use crate::query::context::request_context::RequestContext;
use crate::query::planner::plan::{
    ExecutionPlan, NodeId, PlanArena, PlanDescription, PlanNode, ProfileStats,
};
use crate::stats::StatsManager;
use crate::storage::StorageClient;

pub struct QueryContext {
    rctx: Arc<RequestContext>,
    ectx: ExecutionContext,
    arena: RwLock<PlanArena>,
    plan: RwLock<Option<ExecutionPlan>>,
    killed: AtomicBool,
    config: Arc<Config>,
    stats: Arc<StatsManager>,
    storage: Option<Arc<dyn StorageClient>>,
    /// Per-node executor stats, collected when profiling is on.
    profiling: AtomicBool,
    profiles: DashMap<NodeId, ProfileStats>,
}

impl QueryContext {
    pub fn new(rctx: Arc<RequestContext>, config: Arc<Config>, stats: Arc<StatsManager>) -> Self {
        Self {
            rctx,
            ectx: ExecutionContext::new(),
            arena: RwLock::new(PlanArena::new()),
            plan: RwLock::new(None),
            killed: AtomicBool::new(false),
            config,
            stats,
            storage: None,
            profiling: AtomicBool::new(false),
            profiles: DashMap::new(),
        }
    }

    pub fn with_storage(mut self, storage: Arc<dyn StorageClient>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn rctx(&self) -> &Arc<RequestContext> {
        &self.rctx
    }

    pub fn ectx(&self) -> &ExecutionContext {
        &self.ectx
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn stats(&self) -> &StatsManager {
        &self.stats
    }

    pub fn storage_client(&self) -> GraphResult<&Arc<dyn StorageClient>> {
        self.storage
            .as_ref()
            .ok_or_else(|| Status::error("No storage client configured"))
    }

    /// Mutable access to the arena; used by the planner and optimizer
    /// before the plan is frozen for execution.
    pub fn arena_mut(&self) -> parking_lot::RwLockWriteGuard<'_, PlanArena> {
        self.arena.write()
    }

    pub fn arena(&self) -> parking_lot::RwLockReadGuard<'_, PlanArena> {
        self.arena.read()
    }

    /// Snapshot of one plan node. Executors work off these copies; the
    /// arena itself stays frozen during execution.
    pub fn node(&self, id: NodeId) -> GraphResult<PlanNode> {
        self.arena.read().node(id).cloned()
    }

    pub fn set_plan(&self, plan: ExecutionPlan) {
        *self.plan.write() = Some(plan);
    }

    pub fn has_plan(&self) -> bool {
        self.plan.read().is_some()
    }

    pub fn plan_root(&self) -> GraphResult<NodeId> {
        self.plan
            .read()
            .as_ref()
            .map(|p| p.root())
            .ok_or_else(|| Status::error("Query has no execution plan"))
    }

    pub fn set_plan_root(&self, root: NodeId) -> GraphResult<()> {
        let mut plan = self.plan.write();
        match plan.as_mut() {
            Some(plan) => {
                plan.set_root(root);
                Ok(())
            }
            None => Err(Status::error("Query has no execution plan")),
        }
    }

    /// Shared handle for the optimize phase's scoped timer.
    pub fn optimize_time_handle(&self) -> GraphResult<Arc<AtomicU64>> {
        self.plan
            .read()
            .as_ref()
            .map(|p| p.optimize_time_handle())
            .ok_or_else(|| Status::error("Query has no execution plan"))
    }

    pub fn optimize_time_in_us(&self) -> u64 {
        self.plan
            .read()
            .as_ref()
            .map(|p| p.optimize_time_in_us())
            .unwrap_or(0)
    }

    /// Serialize the current plan for EXPLAIN / PROFILE responses.
    pub fn describe_plan(&self) -> GraphResult<PlanDescription> {
        let plan = self.plan.read();
        let plan = plan
            .as_ref()
            .ok_or_else(|| Status::error("Query has no execution plan"))?;
        let profiles: HashMap<NodeId, ProfileStats> = self
            .profiles
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect();
        plan.describe(&self.arena.read(), &profiles)
    }

    pub fn format_plan_tree(&self) -> String {
        let plan = self.plan.read();
        match plan.as_ref() {
            Some(plan) => plan.format_dependency_tree(&self.arena.read()),
            None => "<no plan>".to_string(),
        }
    }

    pub fn kill(&self) {
        self.killed.store(true, Ordering::SeqCst);
    }

    pub fn is_killed(&self) -> bool {
        self.killed.load(Ordering::SeqCst)
    }

    pub fn enable_profiling(&self) {
        self.profiling.store(true, Ordering::SeqCst);
    }

    pub fn is_profiling(&self) -> bool {
        self.profiling.load(Ordering::SeqCst)
    }

    /// Record executor stats for a node; merges across loop iterations.
    pub fn add_profile(&self, id: NodeId, stats: ProfileStats) {
        if !self.is_profiling() {
            return;
        }
        let mut entry = self.profiles.entry(id).or_default();
        entry.rows += stats.rows;
        entry.exec_duration_us += stats.exec_duration_us;
    }
}
