//! Client response shape.

use serde::Serialize;

use crate::core::{DataSet, ErrorCode};
use crate::query::planner::plan::PlanDescription;

/// Response filled on completion of a query, success or error.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionResponse {
    pub error_code: ErrorCode,
    /// Present only on error.
    pub error_msg: Option<String>,
    /// The session's current graph space, when one is chosen.
    pub space_name: Option<String>,
    /// Total request latency in microseconds.
    pub latency_in_us: u64,
    /// Column-named result rows; present on success when the plan root
    /// produced a dataset.
    pub data: Option<DataSet>,
    /// Plan tree; present for EXPLAIN and PROFILE statements.
    pub plan_desc: Option<PlanDescription>,
}

impl ExecutionResponse {
    pub fn is_success(&self) -> bool {
        self.error_code.is_success()
    }
}
