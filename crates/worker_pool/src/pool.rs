//! WorkerPool - N workers sharing one sink and one intake queue

use std::sync::Arc;
use std::time::Instant;

use async_channel::{Receiver, Sender};
use contracts::{FailureReport, Record, RecordSink};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument, warn};

use crate::error::PoolError;
use crate::metrics::PoolMetrics;

/// What one worker did before it exited
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    pub worker_id: usize,
    /// Records pulled from the intake queue
    pub received: u64,
    /// Records the sink accepted
    pub persisted: u64,
    /// Records the sink rejected
    pub failed: u64,
    /// Exited because of cancellation rather than a closed, drained queue
    pub cancelled: bool,
}

impl WorkerSummary {
    fn new(worker_id: usize) -> Self {
        Self {
            worker_id,
            ..Default::default()
        }
    }
}

/// Handle to the running workers
///
/// Workers never coordinate with each other; the only shared state is the intake
/// queue, the failure queue and the sink.
pub struct WorkerPool {
    handles: Vec<(usize, JoinHandle<WorkerSummary>)>,
    metrics: Arc<PoolMetrics>,
}

impl WorkerPool {
    /// Spawn `worker_count` workers
    ///
    /// Each worker holds a clone of `failure_tx`; the failure queue closes once every
    /// worker has exited and every other clone has been dropped.
    #[instrument(
        name = "worker_pool_spawn",
        skip(sink, intake_rx, failure_tx, metrics, cancel),
        fields(sink = %sink.name())
    )]
    pub fn spawn<S>(
        worker_count: usize,
        sink: Arc<S>,
        intake_rx: Receiver<Record>,
        failure_tx: Sender<FailureReport>,
        metrics: Arc<PoolMetrics>,
        cancel: CancellationToken,
    ) -> Self
    where
        S: RecordSink + Sync + 'static,
    {
        let handles = (0..worker_count)
            .map(|worker_id| {
                let worker = Worker {
                    worker_id,
                    sink: Arc::clone(&sink),
                    intake_rx: intake_rx.clone(),
                    failure_tx: failure_tx.clone(),
                    metrics: Arc::clone(&metrics),
                    cancel: cancel.clone(),
                };
                (worker_id, tokio::spawn(worker.run()))
            })
            .collect();

        observability::record_active_workers(worker_count);
        debug!(workers = worker_count, "Worker pool started");

        Self { handles, metrics }
    }

    /// Number of spawned workers
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Shared counters
    pub fn metrics(&self) -> &Arc<PoolMetrics> {
        &self.metrics
    }

    /// Wait for every worker to exit
    ///
    /// Every handle is awaited even after a failure; the first panic is returned.
    #[instrument(name = "worker_pool_join", skip(self), fields(workers = self.handles.len()))]
    pub async fn join(self) -> Result<Vec<WorkerSummary>, PoolError> {
        let mut summaries = Vec::with_capacity(self.handles.len());
        let mut first_error = None;

        for (worker_id, handle) in self.handles {
            match handle.await {
                Ok(summary) => summaries.push(summary),
                Err(e) => {
                    error!(worker_id, error = %e, "Worker task failed");
                    first_error.get_or_insert_with(|| {
                        PoolError::task_panicked(format!("worker-{worker_id}"), e.to_string())
                    });
                }
            }
        }

        observability::record_active_workers(0);

        match first_error {
            Some(e) => Err(e),
            None => Ok(summaries),
        }
    }
}

struct Worker<S> {
    worker_id: usize,
    sink: Arc<S>,
    intake_rx: Receiver<Record>,
    failure_tx: Sender<FailureReport>,
    metrics: Arc<PoolMetrics>,
    cancel: CancellationToken,
}

impl<S: RecordSink + Sync> Worker<S> {
    #[instrument(
        name = "worker_loop",
        skip(self),
        fields(worker_id = self.worker_id, sink = %self.sink.name())
    )]
    async fn run(self) -> WorkerSummary {
        let mut summary = WorkerSummary::new(self.worker_id);
        debug!("Worker started");

        loop {
            let record = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    summary.cancelled = true;
                    break;
                }
                received = self.intake_rx.recv() => match received {
                    Ok(record) => record,
                    // Closed and drained
                    Err(_) => break,
                },
            };

            summary.received += 1;
            self.metrics.inc_received_count();
            self.persist(record, &mut summary).await;
        }

        debug!(
            received = summary.received,
            persisted = summary.persisted,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "Worker stopped"
        );
        summary
    }

    async fn persist(&self, record: Record, summary: &mut WorkerSummary) {
        let sink_name = self.sink.name();
        let started = Instant::now();
        let result = self.sink.create(&record.data).await;
        observability::record_persist_latency_ms(
            sink_name,
            started.elapsed().as_secs_f64() * 1000.0,
        );

        match result {
            Ok(id) => {
                summary.persisted += 1;
                self.metrics.inc_persisted_count();
                observability::record_persisted(sink_name);
                debug!(line_number = record.line_number, id = %id, "Record persisted");
            }
            Err(e) => {
                summary.failed += 1;
                self.metrics.inc_failed_count();

                let report = FailureReport::persist(record.line_number, e);
                if let Err(closed) = self.failure_tx.send(report).await {
                    warn!(
                        line_number = closed.0.line_number,
                        error = %closed.0.error,
                        "Failure queue closed, report dropped"
                    );
                }
            }
        }
    }
}
