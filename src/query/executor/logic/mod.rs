// Control-flow executors. They publish only their condition outcome; the
// scheduler reads it and dispatches branch subgraphs itself.

pub mod loops;
pub mod select;

pub use loops::LoopExecutor;
pub use select::SelectExecutor;
