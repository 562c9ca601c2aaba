//! Scheduler-level tests: dependency ordering, first-error latching,
//! branch dispatch exclusivity, loop iteration accounting and the
//! EXPLAIN/PROFILE execution split.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{
    int_column, new_query_context, new_query_context_with_storage, new_session, output_var,
    single_column_dataset, CountingStorage, FailingStorage, SpaceKeyedStorage,
};
use graph_query_service::api::service::QueryInstance;
use graph_query_service::core::{ErrorCode, Status, Value};
use graph_query_service::expression::{BinaryOp, Expression};
use graph_query_service::query::optimizer::Optimizer;
use graph_query_service::query::planner::plan::ExecutionPlan;
use graph_query_service::query::scheduler::AsyncMsgNotifyBasedScheduler;

#[tokio::test]
async fn test_dependency_completes_before_successor_starts() {
    // A slow storage scan feeds a filter: the filter can only produce the
    // right rows if the scan's write happened before its read.
    let dataset = single_column_dataset("v", &[1, 2, 3]);
    let storage = SpaceKeyedStorage::new()
        .on("nba", Duration::from_millis(50), Ok(dataset))
        .build();
    let qctx = new_query_context_with_storage("test", new_session(1), storage);

    let root = {
        let mut arena = qctx.arena_mut();
        let start = arena.make_start();
        let scan = arena.make_get_neighbors(start, "nba");
        arena.make_filter(
            scan,
            Expression::binary(
                BinaryOp::Gt,
                Expression::variable("v"),
                Expression::literal(1i64),
            ),
        )
    };
    qctx.set_plan(ExecutionPlan::new(root));

    let scheduler = AsyncMsgNotifyBasedScheduler::new(qctx.clone());
    scheduler.schedule().await.expect("schedule");

    let value = qctx
        .ectx()
        .get_value(&output_var(&qctx, root))
        .expect("root output");
    let ds = value.as_dataset().expect("dataset");
    assert_eq!(ds.num_rows(), 2);
}

#[tokio::test]
async fn test_first_error_wins_between_failing_siblings() {
    // Two sibling scans fail: one immediately with LeaderChanged, one
    // 200ms later with SpaceNotFound. The terminal status must be the
    // first-fulfilled failure.
    let storage = SpaceKeyedStorage::new()
        .on(
            "fast",
            Duration::ZERO,
            Err(Status::LeaderChanged("part 1".to_string())),
        )
        .on(
            "slow",
            Duration::from_millis(200),
            Err(Status::SpaceNotFound("slow".to_string())),
        )
        .build();
    let qctx = new_query_context_with_storage("test", new_session(1), storage);

    let root = {
        let mut arena = qctx.arena_mut();
        let start = arena.make_start();
        let fast = arena.make_get_neighbors(start, "fast");
        let slow = arena.make_get_neighbors(start, "slow");
        let join = arena.make_pass_through(fast);
        arena.add_dep(join, slow);
        join
    };
    qctx.set_plan(ExecutionPlan::new(root));

    let scheduler = AsyncMsgNotifyBasedScheduler::new(qctx.clone());
    let err = scheduler.schedule().await.expect_err("must fail");
    assert_eq!(err, Status::LeaderChanged("part 1".to_string()));
}

#[tokio::test]
async fn test_select_then_branch_exclusive() {
    let qctx = new_query_context("test", new_session(1));
    let (select, then_var, otherwise_var) = build_select_plan(&qctx, true);
    qctx.set_plan(ExecutionPlan::new(select));

    let scheduler = AsyncMsgNotifyBasedScheduler::new(qctx.clone());
    scheduler.schedule().await.expect("schedule");

    assert!(qctx.ectx().exists(&then_var));
    assert!(!qctx.ectx().exists(&otherwise_var));
}

#[tokio::test]
async fn test_select_otherwise_branch_exclusive() {
    let qctx = new_query_context("test", new_session(1));
    let (select, then_var, otherwise_var) = build_select_plan(&qctx, false);
    qctx.set_plan(ExecutionPlan::new(select));

    let scheduler = AsyncMsgNotifyBasedScheduler::new(qctx.clone());
    scheduler.schedule().await.expect("schedule");

    assert!(!qctx.ectx().exists(&then_var));
    assert!(qctx.ectx().exists(&otherwise_var));
}

fn build_select_plan(
    qctx: &graph_query_service::query::context::QueryContext,
    condition: bool,
) -> (
    graph_query_service::query::planner::plan::NodeId,
    String,
    String,
) {
    let mut arena = qctx.arena_mut();
    let input = arena.make_start();
    let then_start = arena.make_start();
    let then_branch = arena.make_project(then_start, vec![int_column(1, "t")]);
    let otherwise_start = arena.make_start();
    let otherwise_branch = arena.make_project(otherwise_start, vec![int_column(2, "e")]);
    let select = arena.make_select(
        input,
        then_branch,
        otherwise_branch,
        Expression::literal(condition),
    );
    let then_var = arena
        .node(then_branch)
        .expect("then node")
        .output_var()
        .to_string();
    let otherwise_var = arena
        .node(otherwise_branch)
        .expect("otherwise node")
        .output_var()
        .to_string();
    (select, then_var, otherwise_var)
}

#[tokio::test]
async fn test_loop_body_dispatch_count() {
    // Condition `i < 2` holds for iterations 0 and 1: the storage-backed
    // body must be invoked exactly twice.
    let storage = CountingStorage::new(single_column_dataset("dst", &[1]));
    let qctx = new_query_context_with_storage("test", new_session(1), storage.clone());

    let lp = {
        let mut arena = qctx.arena_mut();
        let input = arena.make_start();
        let body_start = arena.make_start();
        let body = arena.make_get_neighbors(body_start, "nba");
        let condition = Expression::binary(
            BinaryOp::Lt,
            Expression::variable("i"),
            Expression::literal(2i64),
        );
        arena.make_loop_with_alias(input, body, condition, "i")
    };
    qctx.set_plan(ExecutionPlan::new(lp));

    let scheduler = AsyncMsgNotifyBasedScheduler::new(qctx.clone());
    scheduler.schedule().await.expect("schedule");

    assert_eq!(storage.num_calls(), 2);
}

#[tokio::test]
async fn test_loop_argument_sees_iteration_value() {
    let qctx = new_query_context("test", new_session(1));
    let (lp, arg_var) = {
        let mut arena = qctx.arena_mut();
        let input = arena.make_start();
        let arg = arena.make_argument("i");
        let condition = Expression::binary(
            BinaryOp::Lt,
            Expression::variable("i"),
            Expression::literal(3i64),
        );
        let lp = arena.make_loop_with_alias(input, arg, condition, "i");
        let arg_var = arena.node(arg).expect("argument").output_var().to_string();
        (lp, arg_var)
    };
    qctx.set_plan(ExecutionPlan::new(lp));

    let scheduler = AsyncMsgNotifyBasedScheduler::new(qctx.clone());
    scheduler.schedule().await.expect("schedule");

    // Three iterations republished the argument for i = 0, 1, 2.
    assert_eq!(qctx.ectx().num_versions(&arg_var), 3);
    assert_eq!(
        qctx.ectx().get_value(&arg_var).expect("argument value"),
        Value::Int(2)
    );
}

#[tokio::test]
async fn test_loop_body_may_reference_enclosing_nodes() {
    // The body root data-depends on the Loop node itself. The branch walk
    // must treat that edge as satisfied instead of re-entering the Loop.
    let qctx = new_query_context("test", new_session(1));
    let (lp, body_var) = {
        let mut arena = qctx.arena_mut();
        let input = arena.make_start();
        let body = arena.make_argument("i");
        let condition = Expression::binary(
            BinaryOp::Lt,
            Expression::variable("i"),
            Expression::literal(1i64),
        );
        let lp = arena.make_loop_with_alias(input, body, condition, "i");
        arena.add_dep(body, lp);
        let body_var = arena.node(body).expect("body").output_var().to_string();
        (lp, body_var)
    };
    qctx.set_plan(ExecutionPlan::new(lp));

    let scheduler = AsyncMsgNotifyBasedScheduler::new(qctx.clone());
    scheduler.schedule().await.expect("schedule");

    assert_eq!(qctx.ectx().num_versions(&body_var), 1);
}

#[tokio::test]
async fn test_failure_in_loop_body_aborts() {
    let storage = FailingStorage::new(Status::LeaderChanged("part 9".to_string()));
    let qctx = new_query_context_with_storage("test", new_session(1), storage);

    let lp = {
        let mut arena = qctx.arena_mut();
        let input = arena.make_start();
        let body_start = arena.make_start();
        let body = arena.make_get_neighbors(body_start, "nba");
        let condition = Expression::binary(
            BinaryOp::Lt,
            Expression::variable("i"),
            Expression::literal(5i64),
        );
        arena.make_loop_with_alias(input, body, condition, "i")
    };
    qctx.set_plan(ExecutionPlan::new(lp));

    let scheduler = AsyncMsgNotifyBasedScheduler::new(qctx.clone());
    let err = scheduler.schedule().await.expect_err("body failure");
    assert!(err.is_leader_changed());
}

#[tokio::test]
async fn test_explain_does_not_touch_variable_store() {
    let qctx = new_query_context("EXPLAIN YIELD 1", new_session(1));
    let instance = QueryInstance::new(qctx.clone(), Arc::new(Optimizer::default()));
    instance.execute().await;

    assert_eq!(qctx.ectx().num_vars(), 0);
    let resp = qctx.rctx().take_response();
    assert_eq!(resp.error_code, ErrorCode::Succeeded);
    assert!(resp.plan_desc.is_some());
    assert!(resp.data.is_none());
}

#[tokio::test]
async fn test_profile_executes_and_describes() {
    let qctx = new_query_context("PROFILE YIELD 1 AS a", new_session(1));
    let instance = QueryInstance::new(qctx.clone(), Arc::new(Optimizer::default()));
    instance.execute().await;

    let resp = qctx.rctx().take_response();
    assert_eq!(resp.error_code, ErrorCode::Succeeded);
    let data = resp.data.expect("dataset present");
    assert_eq!(data.col_names, vec!["a".to_string()]);
    let plan_desc = resp.plan_desc.expect("plan description present");
    assert!(plan_desc.nodes.iter().any(|n| n.profile.is_some()));
}

#[tokio::test]
async fn test_cancelled_query_reports_error() {
    let storage = SpaceKeyedStorage::new()
        .on(
            "nba",
            Duration::from_millis(100),
            Ok(single_column_dataset("v", &[1])),
        )
        .build();
    let qctx = new_query_context_with_storage("test", new_session(1), storage);

    let root = {
        let mut arena = qctx.arena_mut();
        let start = arena.make_start();
        let scan = arena.make_get_neighbors(start, "nba");
        arena.make_limit(scan, 1)
    };
    qctx.set_plan(ExecutionPlan::new(root));

    let scheduler = AsyncMsgNotifyBasedScheduler::new(qctx.clone());
    let kill_ctx = qctx.clone();
    let killer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        kill_ctx.kill();
    });

    let err = scheduler.schedule().await.expect_err("killed mid-flight");
    assert!(err.to_string().contains("killed"));
    killer.await.expect("killer task");
}
