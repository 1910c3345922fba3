//! RunHandle - completion handle for a dispatched run

use std::sync::Arc;
use std::time::Instant;

use contracts::RecordSink;
use ingestion::{DispatchStats, IngestionError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};
use worker_pool::{ErrorCollector, MetricsSnapshot, WorkerPool};

use crate::error::RunError;
use crate::report::RunReport;

/// Handle to a run whose dispatch has finished
///
/// Workers and the collector may still be running. `wait` resolves once every
/// worker has drained the intake queue and every failure report has been consumed.
pub struct RunHandle<S> {
    pub(crate) dispatch: DispatchStats,
    pub(crate) dispatch_error: Option<IngestionError>,
    pub(crate) pool: WorkerPool,
    pub(crate) collector: ErrorCollector,
    pub(crate) sink: Arc<S>,
    pub(crate) cancel: CancellationToken,
    pub(crate) started: Instant,
}

impl<S> RunHandle<S>
where
    S: RecordSink + Sync + 'static,
{
    /// Dispatcher counters
    pub fn dispatch_stats(&self) -> DispatchStats {
        self.dispatch
    }

    /// Why dispatch stopped early, if it did
    pub fn dispatch_error(&self) -> Option<&IngestionError> {
        self.dispatch_error.as_ref()
    }

    /// Live pool counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.pool.metrics().snapshot()
    }

    /// Stop workers at their next pull; queued records are left unprocessed
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for workers and collector, then flush the sink
    ///
    /// Dispatch and flush errors do not make this fail; they are carried in
    /// `RunReport::dispatch_error` and `RunReport::flush_error`.
    ///
    /// # Errors
    /// A worker or the collector panicked.
    #[instrument(name = "run_handle_wait", skip(self), fields(sink = %self.sink.name()))]
    pub async fn wait(self) -> Result<RunReport, RunError> {
        let workers = self.pool.join().await;

        // The collector always finishes once the workers are gone, so join it even
        // when a worker failed.
        let collected = self.collector.join().await;
        let mut workers = workers?;
        let collected = collected?;

        // Keep the report on a failed flush; the failure reports are only held here.
        let flush_error = self.sink.flush().await.err();
        if let Some(e) = &flush_error {
            error!(sink = %self.sink.name(), error = %e, "Flush failed");
        }

        workers.sort_by_key(|w| w.worker_id);
        let persisted = workers.iter().map(|w| w.persisted).sum();
        let failed = workers.iter().map(|w| w.failed).sum();

        let report = RunReport {
            dispatch: self.dispatch,
            persisted,
            failed,
            workers,
            failures: collected.failures,
            failures_discarded: collected.discarded,
            failure_summary: collected.summary,
            dispatch_error: self.dispatch_error,
            flush_error,
            elapsed: self.started.elapsed(),
        };

        match &report.dispatch_error {
            None => info!(
                dispatched = report.dispatch.dispatched,
                persisted = report.persisted,
                failed = report.failed,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "Run complete"
            ),
            Some(e) => warn!(
                dispatched = report.dispatch.dispatched,
                persisted = report.persisted,
                failed = report.failed,
                error = %e,
                "Run finished after dispatch error"
            ),
        }

        Ok(report)
    }

    /// Let the run finish in the background
    pub fn detach(self) -> JoinHandle<Result<RunReport, RunError>> {
        tokio::spawn(self.wait())
    }
}
