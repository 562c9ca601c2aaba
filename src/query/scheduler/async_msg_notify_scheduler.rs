//! Asynchronous message-notify scheduler.
//!
//! Walks the plan DAG from the root over data-dependency edges, spawns one
//! task per node and wires the tasks together with oneshot channels: a node
//! holds one sender per data-dependency successor (its promises) and one
//! receiver per input (its futures). Nothing polls; a node task sleeps on
//! its receivers until every input has completed, runs its executor, then
//! fulfils its promises.
//!
//! Branch references of Select and Loop nodes never enter the walk; they
//! are dispatched by the control-flow handlers below, each dispatch being a
//! fresh sub-walk with fresh channels. A sub-walk receives the set of nodes
//! already claimed by its enclosing walks as a boundary: edges into the
//! boundary are treated as satisfied, which is how a loop body may
//! reference a node that data-depends on the Loop itself without the walk
//! re-entering it.
//!
//! Failure semantics: the first failure observed is latched and aborts the
//! scheduler; tasks check the abort latch before running their executor, so
//! no new executor starts after the terminal promise is fulfilled. In-flight
//! executors finish on their own and their results are discarded. Later
//! failures are logged and dropped.

use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::core::{GraphResult, Status, Value};
use crate::query::context::QueryContext;
use crate::query::executor::ExecutorFactory;
use crate::query::planner::plan::{NodeBody, NodeId, PlanNodeKind};

type ExecMsg = GraphResult<()>;
type Promises = Vec<oneshot::Sender<ExecMsg>>;
type Futures = Vec<oneshot::Receiver<ExecMsg>>;

#[derive(Clone)]
pub struct AsyncMsgNotifyBasedScheduler {
    qctx: Arc<QueryContext>,
    failed: Arc<Mutex<Option<Status>>>,
    aborting: Arc<AtomicBool>,
}

impl AsyncMsgNotifyBasedScheduler {
    pub fn new(qctx: Arc<QueryContext>) -> Self {
        Self {
            qctx,
            failed: Arc::new(Mutex::new(None)),
            aborting: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Drive the plan to completion. Resolves with the first failure
    /// observed, or `Ok` once the root node has finished.
    pub async fn schedule(&self) -> GraphResult<()> {
        let root = self.qctx.plan_root()?;
        log::debug!(
            "query {} scheduling plan:\n{}",
            self.qctx.rctx().query_id(),
            self.qctx.format_plan_tree()
        );

        match self.do_schedule(root, Arc::new(HashSet::new())).await {
            Ok(()) => Ok(()),
            Err(err) => Err(self.first_failure().unwrap_or(err)),
        }
    }

    /// Dispatch the subgraph rooted at `root`. `boundary` holds the nodes
    /// claimed by enclosing walks; their outputs are already in the
    /// variable store, so edges into them are treated as satisfied.
    fn do_schedule(
        &self,
        root: NodeId,
        boundary: Arc<HashSet<NodeId>>,
    ) -> Pin<Box<dyn Future<Output = GraphResult<()>> + Send + '_>> {
        Box::pin(async move {
            if boundary.contains(&root) {
                return Ok(());
            }

            let (order, edges) = self.analyze(root, &boundary)?;

            // One channel per data-dependency edge, plus the terminal
            // channel on the root. Channels are created only after the walk
            // so every node's promise list is complete before any dispatch.
            let mut future_map: HashMap<NodeId, Futures> = HashMap::new();
            let mut promise_map: HashMap<NodeId, Promises> = HashMap::new();
            for (successor, dep) in edges {
                let (tx, rx) = oneshot::channel();
                promise_map.entry(dep).or_default().push(tx);
                future_map.entry(successor).or_default().push(rx);
            }
            let (terminal_tx, terminal_rx) = oneshot::channel();
            promise_map.entry(root).or_default().push(terminal_tx);

            // Branch dispatches from this walk must not re-enter its nodes.
            let child_boundary: Arc<HashSet<NodeId>> = Arc::new(
                boundary
                    .iter()
                    .copied()
                    .chain(order.iter().copied())
                    .collect(),
            );

            for id in order {
                let futures = future_map.remove(&id).unwrap_or_default();
                let promises = promise_map.remove(&id).unwrap_or_default();
                let kind = self.qctx.node(id)?.kind();
                let scheduler = self.clone();
                let branch_boundary = child_boundary.clone();
                tokio::spawn(async move {
                    match kind {
                        PlanNodeKind::Select => {
                            scheduler
                                .run_select(id, futures, promises, branch_boundary)
                                .await;
                        }
                        PlanNodeKind::Loop => {
                            scheduler
                                .run_loop(id, futures, promises, branch_boundary)
                                .await;
                        }
                        _ => scheduler.run_executor(id, futures, promises).await,
                    }
                });
            }

            match terminal_rx.await {
                Ok(result) => result,
                Err(_) => Err(self
                    .first_failure()
                    .unwrap_or_else(|| Status::error("Scheduler channel closed unexpectedly"))),
            }
        })
    }

    /// Breadth-first walk over data-dependency edges only. Returns the
    /// visited nodes and the (successor, dependency) edge list; edges into
    /// the boundary are dropped.
    fn analyze(
        &self,
        root: NodeId,
        boundary: &HashSet<NodeId>,
    ) -> GraphResult<(Vec<NodeId>, Vec<(NodeId, NodeId)>)> {
        let mut order = Vec::new();
        let mut edges = Vec::new();
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut queue = VecDeque::from([root]);

        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            order.push(id);
            let node = self.qctx.node(id)?;
            for dep in node.deps() {
                if boundary.contains(dep) {
                    continue;
                }
                edges.push((id, *dep));
                queue.push_back(*dep);
            }
        }

        Ok((order, edges))
    }

    async fn run_executor(&self, id: NodeId, futures: Futures, promises: Promises) {
        if let Err(err) = self.wait_and_check(futures).await {
            self.notify(promises, Err(err));
            return;
        }

        match self.execute_node(id).await {
            Ok(()) => self.notify(promises, Ok(())),
            Err(err) => {
                let first = self.latch_failure(err);
                self.notify(promises, Err(first));
            }
        }
    }

    /// Select: evaluate the condition, then dispatch exactly one of the two
    /// branch subgraphs.
    async fn run_select(
        &self,
        id: NodeId,
        futures: Futures,
        promises: Promises,
        boundary: Arc<HashSet<NodeId>>,
    ) {
        if let Err(err) = self.wait_and_check(futures).await {
            self.notify(promises, Err(err));
            return;
        }

        let result = self.drive_select(id, boundary).await;
        match result {
            Ok(()) => self.notify(promises, Ok(())),
            Err(err) => {
                let first = self.latch_failure(err);
                self.notify(promises, Err(first));
            }
        }
    }

    async fn drive_select(&self, id: NodeId, boundary: Arc<HashSet<NodeId>>) -> GraphResult<()> {
        self.execute_node(id).await?;
        let chosen = self.read_condition(id)?;

        let node = self.qctx.node(id)?;
        let branch = match node.body() {
            NodeBody::Select {
                then_branch,
                otherwise_branch,
                ..
            } => {
                if chosen {
                    *then_branch
                } else {
                    *otherwise_branch
                }
            }
            other => {
                return Err(Status::error(format!(
                    "Select dispatch on {} node {}",
                    other.kind().name(),
                    id
                )));
            }
        };

        log::debug!(
            "select {} chose the {} branch ({})",
            id,
            if chosen { "then" } else { "otherwise" },
            branch
        );
        self.do_schedule(branch, boundary).await
    }

    /// Loop: re-evaluate the condition before every iteration; while it
    /// holds, bind the iteration counter and dispatch the body subgraph
    /// afresh. Iterations are sequential.
    async fn run_loop(
        &self,
        id: NodeId,
        futures: Futures,
        promises: Promises,
        boundary: Arc<HashSet<NodeId>>,
    ) {
        if let Err(err) = self.wait_and_check(futures).await {
            self.notify(promises, Err(err));
            return;
        }

        let result = self.drive_loop(id, boundary).await;
        match result {
            Ok(()) => self.notify(promises, Ok(())),
            Err(err) => {
                let first = self.latch_failure(err);
                self.notify(promises, Err(first));
            }
        }
    }

    async fn drive_loop(&self, id: NodeId, boundary: Arc<HashSet<NodeId>>) -> GraphResult<()> {
        let node = self.qctx.node(id)?;
        let (body, iter_alias) = match node.body() {
            NodeBody::Loop {
                body, iter_alias, ..
            } => (*body, iter_alias.clone()),
            other => {
                return Err(Status::error(format!(
                    "Loop dispatch on {} node {}",
                    other.kind().name(),
                    id
                )));
            }
        };

        let mut iteration: i64 = 0;
        loop {
            self.check_dispatchable()?;

            if let Some(alias) = &iter_alias {
                self.qctx
                    .ectx()
                    .set_value(alias, Value::Int(iteration), true)?;
            }

            self.execute_node(id).await?;
            if !self.read_condition(id)? {
                log::debug!("loop {} finished after {} iterations", id, iteration);
                return Ok(());
            }

            self.do_schedule(body, boundary.clone()).await?;
            iteration += 1;
        }
    }

    /// Await every input's completion message, then verify the scheduler is
    /// still dispatching.
    async fn wait_and_check(&self, futures: Futures) -> GraphResult<()> {
        let mut statuses = Vec::with_capacity(futures.len());
        for rx in futures {
            let status = rx
                .await
                .unwrap_or_else(|_| Err(Status::error("Executor dependency was dropped")));
            statuses.push(status);
        }
        self.check_status(statuses)?;
        self.check_dispatchable()
    }

    /// First error among the collected dependency statuses wins.
    fn check_status(&self, statuses: Vec<ExecMsg>) -> GraphResult<()> {
        statuses.into_iter().collect()
    }

    fn check_dispatchable(&self) -> GraphResult<()> {
        if self.qctx.is_killed() {
            return Err(Status::error("Query was killed"));
        }
        if self.aborting.load(Ordering::SeqCst) {
            return Err(self
                .first_failure()
                .unwrap_or_else(|| Status::error("Scheduler is aborting")));
        }
        Ok(())
    }

    /// Run the node's executor on the worker pool. A panicking executor is
    /// reported as an execution error carrying the panic message.
    async fn execute_node(&self, id: NodeId) -> GraphResult<()> {
        let qctx = self.qctx.clone();
        let handle = tokio::spawn(async move {
            let mut executor = ExecutorFactory::make_executor(&qctx, id)?;
            log::debug!("executing {} [{}]", executor.name(), id);
            executor.execute().await
        });

        match handle.await {
            Ok(result) => result,
            Err(join_err) if join_err.is_panic() => {
                let panic = join_err.into_panic();
                let msg = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(Status::error(format!("Executor panicked: {}", msg)))
            }
            Err(_) => Err(Status::error("Executor task was cancelled")),
        }
    }

    /// Read the boolean a Select/Loop executor published under its output
    /// variable.
    fn read_condition(&self, id: NodeId) -> GraphResult<bool> {
        let node = self.qctx.node(id)?;
        let value = self.qctx.ectx().get_value(node.output_var())?;
        value.as_bool().ok_or_else(|| {
            Status::error(format!(
                "{} condition did not produce a boolean",
                node.kind().name()
            ))
        })
    }

    /// Latch the first failure and flip the abort flag; later failures are
    /// logged and dropped. Returns the failure that won.
    fn latch_failure(&self, status: Status) -> Status {
        self.aborting.store(true, Ordering::SeqCst);
        let mut failed = self.failed.lock();
        match failed.as_ref() {
            Some(first) => {
                log::debug!("dropping subsequent failure: {}", status);
                first.clone()
            }
            None => {
                *failed = Some(status.clone());
                status
            }
        }
    }

    fn first_failure(&self) -> Option<Status> {
        self.failed.lock().clone()
    }

    fn notify(&self, promises: Promises, result: ExecMsg) {
        for tx in promises {
            // A dropped receiver means the successor is gone already;
            // nothing to do.
            let _ = tx.send(result.clone());
        }
    }
}
