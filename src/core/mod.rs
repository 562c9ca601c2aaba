// Core types shared across the query pipeline:
// - value: runtime values and datasets flowing between executors
// - error: internal status codes and the client-facing error surface

pub mod error;
pub mod value;

pub use error::{ErrorCode, GraphResult, Status};
pub use value::{DataSet, NullType, Row, Value};
