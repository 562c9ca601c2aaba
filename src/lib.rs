//! Query execution core of a distributed graph database's query service.
//!
//! This crate takes a raw query string plus a client session and drives it
//! through the full pipeline:
//! - Parsing the query into a sentence tree
//! - Validating and planning into an executable plan DAG
//! - Optimizing the plan under the optimizer handoff interface
//! - Scheduling plan-node executors asynchronously over a thread pool
//! - Filling the client response and recording query metrics

pub mod api;
pub mod config;
pub mod core;
pub mod expression;
pub mod query;
pub mod stats;
pub mod storage;
pub mod utils;
