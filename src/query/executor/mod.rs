// Plan-node executors.
//
// One executor instance runs one plan node: it reads the node's input
// variables from the execution context, does its work and publishes its
// output variable. Control-flow nodes (Select, Loop) only publish their
// condition outcome; the scheduler consumes it to drive branch dispatch.

pub mod base;
pub mod data_access;
pub mod factory;
pub mod logic;
pub mod result_processing;
pub mod special_executors;

pub use base::{BaseExecutor, Executor};
pub use factory::ExecutorFactory;
