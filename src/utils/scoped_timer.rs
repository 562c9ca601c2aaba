//! Scope-bound elapsed-time recording.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Records elapsed microseconds into a shared counter when dropped.
///
/// The optimize phase runs under one of these so the plan's optimizer
/// latency field is written on every exit path, error paths included.
pub struct ScopedTimer {
    target: Arc<AtomicU64>,
    start: Instant,
}

impl ScopedTimer {
    pub fn new(target: Arc<AtomicU64>) -> Self {
        Self {
            target,
            start: Instant::now(),
        }
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed().as_micros() as u64;
        self.target.store(elapsed, Ordering::Relaxed);
    }
}
