//! Pool metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by every worker and the collector
#[derive(Debug, Default)]
pub struct PoolMetrics {
    /// Records pulled from the intake queue
    received_count: AtomicU64,
    /// Records the sink accepted
    persisted_count: AtomicU64,
    /// Records the sink rejected
    failed_count: AtomicU64,
    /// Failure reports consumed by the collector
    reported_count: AtomicU64,
}

impl PoolMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received_count(&self) -> u64 {
        self.received_count.load(Ordering::Relaxed)
    }

    pub fn inc_received_count(&self) {
        self.received_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn persisted_count(&self) -> u64 {
        self.persisted_count.load(Ordering::Relaxed)
    }

    pub fn inc_persisted_count(&self) {
        self.persisted_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failed_count(&self) -> u64 {
        self.failed_count.load(Ordering::Relaxed)
    }

    pub fn inc_failed_count(&self) {
        self.failed_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reported_count(&self) -> u64 {
        self.reported_count.load(Ordering::Relaxed)
    }

    pub fn inc_reported_count(&self) {
        self.reported_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            received_count: self.received_count(),
            persisted_count: self.persisted_count(),
            failed_count: self.failed_count(),
            reported_count: self.reported_count(),
        }
    }
}

/// Snapshot of pool metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub received_count: u64,
    pub persisted_count: u64,
    pub failed_count: u64,
    pub reported_count: u64,
}
