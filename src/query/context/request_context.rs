//! Per-request context: the raw query, the issuing session and the
//! response slot that terminal paths fill.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::api::response::ExecutionResponse;
use crate::api::session::ClientSession;

pub struct RequestContext {
    query_id: i64,
    query: String,
    session: Arc<ClientSession>,
    resp: Mutex<ExecutionResponse>,
    start: Instant,
    finished: AtomicBool,
}

impl RequestContext {
    pub fn new(query_id: i64, query: String, session: Arc<ClientSession>) -> Self {
        session.charge();
        Self {
            query_id,
            query,
            session,
            resp: Mutex::new(ExecutionResponse::default()),
            start: Instant::now(),
            finished: AtomicBool::new(false),
        }
    }

    pub fn query_id(&self) -> i64 {
        self.query_id
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn session(&self) -> &Arc<ClientSession> {
        &self.session
    }

    /// Mutate the response slot under its lock.
    pub fn with_resp<R>(&self, f: impl FnOnce(&mut ExecutionResponse) -> R) -> R {
        f(&mut self.resp.lock())
    }

    /// Elapsed time since the request arrived, in microseconds.
    pub fn duration_in_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    /// Mark the request finished. Idempotent; the first call wins.
    pub fn finish(&self) {
        self.finished.store(true, Ordering::SeqCst);
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    /// Take the response out of the slot, leaving a default in place.
    /// Intended for the frontend once the request has finished.
    pub fn take_response(&self) -> ExecutionResponse {
        std::mem::take(&mut self.resp.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::session::Session;
    use crate::core::ErrorCode;

    #[test]
    fn test_response_slot() {
        let session = ClientSession::new(Session {
            session_id: 1,
            user_name: "root".to_string(),
            timezone: None,
        });
        let rctx = RequestContext::new(1, "YIELD 1".to_string(), session);

        rctx.with_resp(|resp| resp.latency_in_us = 42);
        assert!(!rctx.is_finished());
        rctx.finish();

        let resp = rctx.take_response();
        assert_eq!(resp.latency_in_us, 42);
        assert_eq!(resp.error_code, ErrorCode::Succeeded);
    }
}
