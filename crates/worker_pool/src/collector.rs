//! ErrorCollector - drains the failure queue for the lifetime of a run

use std::sync::Arc;

use async_channel::Receiver;
use contracts::FailureReport;
use observability::{FailureAggregator, FailureSummary};
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument};

use crate::error::PoolError;
use crate::metrics::PoolMetrics;

/// Reports kept in memory per run; the rest are only logged and counted
pub const DEFAULT_RETAINED_FAILURES: usize = 10_000;

/// Everything the collector consumed
#[derive(Debug, Default)]
pub struct CollectorSummary {
    /// Retained reports, in arrival order
    pub failures: Vec<FailureReport>,

    /// Reports consumed but not retained
    pub discarded: u64,

    /// Aggregated counts over every consumed report
    pub summary: FailureSummary,
}

impl CollectorSummary {
    /// Every report consumed, retained or not
    pub fn total(&self) -> u64 {
        self.summary.total
    }
}

/// Handle to the running collector task
pub struct ErrorCollector {
    handle: JoinHandle<CollectorSummary>,
}

impl ErrorCollector {
    /// Spawn the collector
    ///
    /// It exits once the failure queue is closed and drained, which happens when every
    /// producer has dropped its `Sender`.
    pub fn spawn(
        failure_rx: Receiver<FailureReport>,
        metrics: Arc<PoolMetrics>,
        retain_limit: usize,
    ) -> Self {
        let handle = tokio::spawn(collect(failure_rx, metrics, retain_limit));
        Self { handle }
    }

    /// Wait for the collector to finish
    pub async fn join(self) -> Result<CollectorSummary, PoolError> {
        self.handle
            .await
            .map_err(|e| PoolError::task_panicked("error-collector", e.to_string()))
    }
}

#[instrument(name = "error_collector_loop", skip(failure_rx, metrics))]
async fn collect(
    failure_rx: Receiver<FailureReport>,
    metrics: Arc<PoolMetrics>,
    retain_limit: usize,
) -> CollectorSummary {
    let mut aggregator = FailureAggregator::new();
    let mut failures = Vec::new();
    let mut discarded = 0u64;

    while let Ok(report) = failure_rx.recv().await {
        error!(
            line_number = report.line_number,
            stage = %report.stage,
            error = %report.error,
            "worker error"
        );
        observability::record_failure_reported(report.stage);
        metrics.inc_reported_count();
        aggregator.update(&report);

        if failures.len() < retain_limit {
            failures.push(report);
        } else {
            discarded += 1;
        }
    }

    debug!(
        total = aggregator.total,
        discarded, "Failure queue closed, collector stopped"
    );

    CollectorSummary {
        failures,
        discarded,
        summary: aggregator.summary(),
    }
}
