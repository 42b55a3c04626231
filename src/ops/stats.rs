//! Dispatch counters.
//!
//! Metrics namespace: `memshard.dispatch.*`.

use crate::dispatch::ReplyOutcome;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Metric names.
pub mod metrics {
    /// Calls to `dispatch`.
    pub const REQUESTS_TOTAL: &str = "memshard.dispatch.requests_total";
    /// Calls rejected before any I/O.
    pub const REJECTED_TOTAL: &str = "memshard.dispatch.rejected_total";
    /// Calls that returned a value.
    pub const SUCCESS_TOTAL: &str = "memshard.dispatch.success_total";
    /// Replica attempts made.
    pub const ATTEMPTS_TOTAL: &str = "memshard.dispatch.attempts_total";
    /// Ring advances to the next server.
    pub const RING_ADVANCES_TOTAL: &str = "memshard.dispatch.ring_advances_total";
    /// Attempts answered with `NOT_FOUND`.
    pub const NOT_FOUND_TOTAL: &str = "memshard.dispatch.not_found_total";
    /// Attempts answered with `ERROR`.
    pub const PROTOCOL_ERRORS_TOTAL: &str = "memshard.dispatch.protocol_errors_total";
    /// Attempts that failed in the transport.
    pub const TRANSPORT_FAILURES_TOTAL: &str = "memshard.dispatch.transport_failures_total";
}

/// Counters updated by the dispatcher.
#[derive(Debug, Default)]
pub struct DispatchStats {
    requests: AtomicU64,
    rejected: AtomicU64,
    successes: AtomicU64,
    attempts: AtomicU64,
    ring_advances: AtomicU64,
    not_found: AtomicU64,
    protocol_errors: AtomicU64,
    transport_failures: AtomicU64,
}

impl DispatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ring_advance(&self) {
        self.ring_advances.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one attempt and its outcome.
    pub fn record_attempt(&self, outcome: &ReplyOutcome) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            ReplyOutcome::Stored(_) => return,
            ReplyOutcome::NotFound => &self.not_found,
            ReplyOutcome::ProtocolError => &self.protocol_errors,
            ReplyOutcome::Transport(_) => &self.transport_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            attempts: self.attempts.load(Ordering::Relaxed),
            ring_advances: self.ring_advances.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            protocol_errors: self.protocol_errors.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
        }
    }
}

/// Serializable counter values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub requests: u64,
    pub rejected: u64,
    pub successes: u64,
    pub attempts: u64,
    pub ring_advances: u64,
    pub not_found: u64,
    pub protocol_errors: u64,
    pub transport_failures: u64,
}

impl StatsSnapshot {
    /// Counters keyed by metric name.
    pub fn as_pairs(&self) -> Vec<(&'static str, u64)> {
        vec![
            (metrics::REQUESTS_TOTAL, self.requests),
            (metrics::REJECTED_TOTAL, self.rejected),
            (metrics::SUCCESS_TOTAL, self.successes),
            (metrics::ATTEMPTS_TOTAL, self.attempts),
            (metrics::RING_ADVANCES_TOTAL, self.ring_advances),
            (metrics::NOT_FOUND_TOTAL, self.not_found),
            (metrics::PROTOCOL_ERRORS_TOTAL, self.protocol_errors),
            (metrics::TRANSPORT_FAILURES_TOTAL, self.transport_failures),
        ]
    }
}
