//! One query, end to end.
//!
//! A `QueryInstance` owns everything one request allocates and drives the
//! lifecycle: parse, validate, optimize, then either serialize the plan
//! (EXPLAIN) or schedule it, and finally fill the response, record metrics
//! and deregister from the session. The instance is consumed by value on
//! either terminal path, so teardown happens exactly once and the query
//! context — with the arena and every plan node in it — is released with
//! it: the instance is the unique ownership root of the request.

use std::sync::Arc;

use crate::core::{GraphResult, Status};
use crate::query::context::QueryContext;
use crate::query::optimizer::Optimizer;
use crate::query::parser::{GQLParser, Sentence};
use crate::query::scheduler::AsyncMsgNotifyBasedScheduler;
use crate::query::validator::Validator;
use crate::stats::MetricId;
use crate::utils::ScopedTimer;

pub struct QueryInstance {
    qctx: Arc<QueryContext>,
    optimizer: Arc<Optimizer>,
    scheduler: AsyncMsgNotifyBasedScheduler,
    sentence: Option<Sentence>,
}

impl QueryInstance {
    pub fn new(qctx: Arc<QueryContext>, optimizer: Arc<Optimizer>) -> Self {
        let scheduler = AsyncMsgNotifyBasedScheduler::new(qctx.clone());
        let rctx = qctx.rctx();
        rctx.session()
            .add_query(rctx.query_id(), rctx.query().to_string());
        Self {
            qctx,
            optimizer,
            scheduler,
            sentence: None,
        }
    }

    pub async fn execute(mut self) {
        if let Err(status) = self.validate_and_optimize() {
            self.on_error(status);
            return;
        }

        match self.explain_or_continue() {
            Err(status) => {
                self.on_error(status);
                return;
            }
            Ok(false) => {
                self.on_finish();
                return;
            }
            Ok(true) => {}
        }

        match self.scheduler.schedule().await {
            Ok(()) => self.on_finish(),
            Err(status) => self.on_error(status),
        }
    }

    fn validate_and_optimize(&mut self) -> GraphResult<()> {
        let rctx = self.qctx.rctx().clone();
        let space_name = rctx.session().space_name();
        log::debug!("parsing query {}: {}", rctx.query_id(), rctx.query());

        let sentence = GQLParser::new().parse(rctx.query())?;
        self.record_sentence_count(&sentence, &space_name);

        Validator::validate(&sentence, &self.qctx)?;
        self.find_best_plan()?;

        let stats = self.qctx.stats();
        let optimize_time = self.qctx.optimize_time_in_us();
        stats.record_histo(MetricId::OptimizerLatencyUs, optimize_time);
        if self.space_metrics_enabled(&space_name) {
            stats.record_space_histo(&space_name, MetricId::OptimizerLatencyUs, optimize_time);
        }

        self.sentence = Some(sentence);
        Ok(())
    }

    fn record_sentence_count(&self, sentence: &Sentence, space_name: &str) {
        let count = sentence.num_sentences() as u64;
        let stats = self.qctx.stats();
        stats.add_value_with_amount(MetricId::NumSentences, count);
        if self.space_metrics_enabled(space_name) {
            stats.add_space_value_with_amount(space_name, MetricId::NumSentences, count);
        }
    }

    /// Install the optimizer's best root under a scoped timer; elapsed
    /// microseconds land in the plan's optimizer-latency field on every
    /// exit path.
    fn find_best_plan(&self) -> GraphResult<()> {
        let _timer = ScopedTimer::new(self.qctx.optimize_time_handle()?);
        let root = self.optimizer.find_best_plan(&self.qctx)?;
        self.qctx.set_plan_root(root)
    }

    /// For EXPLAIN, serialize the plan into the response. Returns whether
    /// execution should continue: always for plain statements, and for
    /// EXPLAIN only when it is a PROFILE.
    fn explain_or_continue(&self) -> GraphResult<bool> {
        let sentence = self
            .sentence
            .as_ref()
            .ok_or_else(|| Status::error("Query has no parsed sentence"))?;
        if !sentence.is_explain() {
            return Ok(true);
        }

        let plan_desc = self.qctx.describe_plan()?;
        self.qctx
            .rctx()
            .with_resp(|resp| resp.plan_desc = Some(plan_desc));

        if sentence.is_profile() {
            self.qctx.enable_profiling();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn on_finish(self) {
        let rctx = self.qctx.rctx();
        log::debug!("finished query {}: {}", rctx.query_id(), rctx.query());
        let space_name = rctx.session().space_name();
        rctx.with_resp(|resp| {
            resp.space_name = if space_name.is_empty() {
                None
            } else {
                Some(space_name.clone())
            };
        });

        // For PROFILE, refresh the plan description with executor stats
        // collected during the run.
        if self.qctx.is_profiling() {
            if let Ok(plan_desc) = self.qctx.describe_plan() {
                rctx.with_resp(|resp| resp.plan_desc = Some(plan_desc));
            }
        }

        self.fill_resp_data();

        let latency = rctx.duration_in_us();
        rctx.with_resp(|resp| resp.latency_in_us = latency);
        self.add_slow_query_stats(latency, &space_name);

        rctx.session().delete_query(rctx.query_id());
        rctx.finish();
        // Dropping `self` here releases the query context and the whole
        // plan arena: the instance is the last owner standing.
    }

    fn on_error(self, status: Status) {
        let rctx = self.qctx.rctx();
        log::error!("query {} failed: {}", rctx.query_id(), status);
        let space_name = rctx.session().space_name();
        let stats = self.qctx.stats();

        if status.is_leader_changed() {
            stats.add_value(MetricId::NumQueryErrorsLeaderChanges);
            if self.space_metrics_enabled(&space_name) {
                stats.add_space_value(&space_name, MetricId::NumQueryErrorsLeaderChanges);
            }
        }

        let latency = rctx.duration_in_us();
        rctx.with_resp(|resp| {
            resp.error_code = status.error_code();
            resp.error_msg = Some(status.to_string());
            resp.space_name = if space_name.is_empty() {
                None
            } else {
                Some(space_name.clone())
            };
            resp.latency_in_us = latency;
        });

        stats.add_value(MetricId::NumQueryErrors);
        if self.space_metrics_enabled(&space_name) {
            stats.add_space_value(&space_name, MetricId::NumQueryErrors);
        }
        self.add_slow_query_stats(latency, &space_name);

        rctx.session().delete_query(rctx.query_id());
        rctx.finish();
    }

    /// Move the root's output dataset into the response. An output whose
    /// column-name list is empty is an internal error, not a result.
    fn fill_resp_data(&self) {
        let root = match self.qctx.plan_root() {
            Ok(root) => root,
            Err(_) => return,
        };
        let output_var = match self.qctx.node(root) {
            Ok(node) => node.output_var().to_string(),
            Err(_) => return,
        };
        if !self.qctx.ectx().exists(&output_var) {
            return;
        }

        let value = match self.qctx.ectx().move_value(&output_var) {
            Ok(value) => value,
            Err(_) => return,
        };
        let dataset = match value.into_dataset() {
            Some(ds) => ds,
            None => return,
        };

        let rctx = self.qctx.rctx();
        if dataset.col_names.is_empty() {
            log::error!("query {} produced an empty column name list", rctx.query_id());
            rctx.with_resp(|resp| {
                resp.error_code = crate::core::ErrorCode::ExecutionError;
                resp.error_msg = Some("Internal error: empty column name list".to_string());
            });
        } else {
            rctx.with_resp(|resp| resp.data = Some(dataset));
        }
    }

    fn add_slow_query_stats(&self, latency: u64, space_name: &str) {
        let stats = self.qctx.stats();
        let threshold = self.qctx.config().graph.slow_query_threshold_us;

        stats.record_histo(MetricId::QueryLatencyUs, latency);
        if self.space_metrics_enabled(space_name) {
            stats.record_space_histo(space_name, MetricId::QueryLatencyUs, latency);
        }

        if latency > threshold {
            stats.add_value(MetricId::NumSlowQueries);
            stats.record_histo(MetricId::SlowQueryLatencyUs, latency);
            if self.space_metrics_enabled(space_name) {
                stats.add_space_value(space_name, MetricId::NumSlowQueries);
                stats.record_space_histo(space_name, MetricId::SlowQueryLatencyUs, latency);
            }
        }
    }

    fn space_metrics_enabled(&self, space_name: &str) -> bool {
        self.qctx.config().graph.enable_space_level_metrics && !space_name.is_empty()
    }
}
