//! Optimizer handoff.
//!
//! The rule engine itself lives behind the [`OptRule`] trait; this module
//! only defines the contract the query instance drives: take the validated
//! plan from the query context, run the registered rules over its root and
//! hand back the best root found. Regardless of rules, the optimizer
//! guarantees the returned plan passes the structural integrity checks, so
//! the scheduler can rely on a well-formed DAG.

use crate::core::GraphResult;
use crate::query::context::QueryContext;
use crate::query::planner::plan::NodeId;

/// One rewrite rule. Rules receive the current root and return the root of
/// the rewritten plan, which may be the input unchanged.
pub trait OptRule: Send + Sync {
    fn name(&self) -> &str;
    fn apply(&self, qctx: &QueryContext, root: NodeId) -> GraphResult<NodeId>;
}

/// Rule-driven plan optimizer.
#[derive(Default)]
pub struct Optimizer {
    rules: Vec<Box<dyn OptRule>>,
}

impl Optimizer {
    pub fn new(rules: Vec<Box<dyn OptRule>>) -> Self {
        Self { rules }
    }

    /// Find the best plan for the query and return its root. The plan must
    /// already be installed on the context by validation.
    pub fn find_best_plan(&self, qctx: &QueryContext) -> GraphResult<NodeId> {
        let mut root = qctx.plan_root()?;
        for rule in &self.rules {
            let rewritten = rule.apply(qctx, root)?;
            if rewritten != root {
                log::debug!("rule {} rewrote plan root {} -> {}", rule.name(), root, rewritten);
                root = rewritten;
            }
        }
        qctx.arena().check_integrity(root)?;
        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::session::{ClientSession, Session};
    use crate::config::Config;
    use crate::core::Status;
    use crate::query::context::RequestContext;
    use crate::query::planner::plan::ExecutionPlan;
    use crate::stats::StatsManager;
    use std::sync::Arc;

    fn new_qctx() -> QueryContext {
        let session = ClientSession::new(Session {
            session_id: 1,
            user_name: "root".to_string(),
            timezone: None,
        });
        let rctx = Arc::new(RequestContext::new(1, "YIELD 1".to_string(), session));
        QueryContext::new(
            rctx,
            Arc::new(Config::default()),
            Arc::new(StatsManager::new()),
        )
    }

    struct PassThroughWrapRule;

    impl OptRule for PassThroughWrapRule {
        fn name(&self) -> &str {
            "PassThroughWrapRule"
        }

        fn apply(&self, qctx: &QueryContext, root: NodeId) -> GraphResult<NodeId> {
            Ok(qctx.arena_mut().make_pass_through(root))
        }
    }

    #[test]
    fn test_no_rules_returns_validated_root() {
        let qctx = new_qctx();
        let root = qctx.arena_mut().make_start();
        qctx.set_plan(ExecutionPlan::new(root));

        let optimizer = Optimizer::default();
        assert_eq!(optimizer.find_best_plan(&qctx).expect("best plan"), root);
    }

    #[test]
    fn test_rules_rewrite_root() {
        let qctx = new_qctx();
        let root = qctx.arena_mut().make_start();
        qctx.set_plan(ExecutionPlan::new(root));

        let optimizer = Optimizer::new(vec![Box::new(PassThroughWrapRule)]);
        let best = optimizer.find_best_plan(&qctx).expect("best plan");
        assert_ne!(best, root);
        let node = qctx.node(best).expect("wrapped root");
        assert_eq!(node.input(), Some(root));
    }

    #[test]
    fn test_missing_plan_is_error() {
        let qctx = new_qctx();
        let optimizer = Optimizer::default();
        let err = optimizer.find_best_plan(&qctx).expect_err("no plan");
        assert_eq!(err, Status::error("Query has no execution plan"));
    }
}
