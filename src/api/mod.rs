// Service-facing surface: client sessions, the execution response shape and
// the query engine / query instance that drive one request end to end.

pub mod response;
pub mod service;
pub mod session;

pub use response::ExecutionResponse;
