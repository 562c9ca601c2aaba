pub mod execution_context;
pub mod query_context;
pub mod request_context;

pub use execution_context::ExecutionContext;
pub use query_context::QueryContext;
pub use request_context::RequestContext;
