//! Manager - wires the dispatcher, worker pool and error collector together

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use contracts::{IngestConfig, PipelineSettings, RecordSink};
use ingestion::{read_source, DispatchOptions, Dispatcher};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};
use worker_pool::{
    ConfiguredSink, ErrorCollector, PoolMetrics, WorkerPool, DEFAULT_RETAINED_FAILURES,
};

use crate::error::RunError;
use crate::handle::RunHandle;
use crate::report::RunReport;

/// Pipeline owner
///
/// Creates both queues per run. Only the dispatcher closes the intake queue; the
/// failure queue closes when the dispatcher and every worker have dropped their
/// senders.
pub struct Manager<S> {
    sink: Arc<S>,
    settings: PipelineSettings,
    delimiter: u8,
    retain_limit: usize,
    cancel: CancellationToken,
}

impl<S> Manager<S>
where
    S: RecordSink + Sync + 'static,
{
    /// Create a manager with default settings
    pub fn new(sink: S) -> Self {
        Self::with_shared_sink(Arc::new(sink))
    }

    /// Create a manager around a sink the caller keeps a handle to
    pub fn with_shared_sink(sink: Arc<S>) -> Self {
        Self {
            sink,
            settings: PipelineSettings::default(),
            delimiter: DispatchOptions::default().delimiter,
            retain_limit: DEFAULT_RETAINED_FAILURES,
            cancel: CancellationToken::new(),
        }
    }

    /// Queue capacities, parse policy and default worker count
    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Maximum failure reports kept in a `RunReport`
    pub fn with_retain_limit(mut self, retain_limit: usize) -> Self {
        self.retain_limit = retain_limit;
        self
    }

    /// Use an externally owned token; cancelling it stops every run of this manager
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn sink(&self) -> &Arc<S> {
        &self.sink
    }

    /// Token that cancels every run of this manager
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Dispatch `source` to `worker_count` workers
    ///
    /// Returns once dispatch has finished (end of input, parse abort or
    /// cancellation). The source is read before any worker starts, so an unreadable
    /// source fails here with nothing spawned. Records persisted before a dispatch
    /// error stay persisted.
    ///
    /// # Errors
    /// `InvalidConfig` for an empty source, zero workers or zero queue capacity;
    /// `Dispatch(SourceUnavailable)` when the source cannot be read.
    #[instrument(
        name = "manager_run",
        skip(self, source),
        fields(source = %source.as_ref().display(), sink = %self.sink.name())
    )]
    pub async fn run(
        &self,
        source: impl AsRef<Path>,
        worker_count: usize,
    ) -> Result<RunHandle<S>, RunError> {
        let source = source.as_ref();
        self.check_preconditions(source, worker_count)?;

        let started = Instant::now();
        let bytes = read_source(source).await?;

        let cancel = self.cancel.child_token();
        let (intake_tx, intake_rx) = async_channel::bounded(self.settings.intake_capacity);
        let (failure_tx, failure_rx) = async_channel::bounded(self.settings.failure_capacity);
        let metrics = Arc::new(PoolMetrics::new());

        let pool = WorkerPool::spawn(
            worker_count,
            Arc::clone(&self.sink),
            intake_rx,
            failure_tx.clone(),
            Arc::clone(&metrics),
            cancel.clone(),
        );
        let collector = ErrorCollector::spawn(failure_rx, metrics, self.retain_limit);

        info!(
            workers = worker_count,
            intake_capacity = self.settings.intake_capacity,
            policy = ?self.settings.parse_error_policy,
            "Run started"
        );

        // The dispatcher takes the last failure sender held here.
        let options = DispatchOptions::new(self.delimiter, self.settings.parse_error_policy);
        let dispatcher = Dispatcher::new(options, intake_tx, failure_tx, cancel.clone());
        let report = dispatcher.run(Cursor::new(bytes)).await;

        Ok(RunHandle {
            dispatch: report.stats,
            dispatch_error: report.error,
            pool,
            collector,
            sink: Arc::clone(&self.sink),
            cancel,
            started,
        })
    }

    /// `run`, then wait for the workers and collector
    ///
    /// Unlike `RunHandle::wait`, a dispatch error is returned as `Err` once everything
    /// has drained.
    pub async fn run_to_completion(
        &self,
        source: impl AsRef<Path>,
        worker_count: usize,
    ) -> Result<RunReport, RunError> {
        self.run(source, worker_count).await?.wait().await?.into_result()
    }

    fn check_preconditions(&self, source: &Path, worker_count: usize) -> Result<(), RunError> {
        if source.as_os_str().is_empty() {
            return Err(RunError::invalid_config("source path is empty"));
        }
        if worker_count == 0 {
            return Err(RunError::invalid_config("worker_count must be >= 1"));
        }
        if self.settings.intake_capacity == 0 {
            return Err(RunError::invalid_config("intake_capacity must be >= 1"));
        }
        if self.settings.failure_capacity == 0 {
            return Err(RunError::invalid_config("failure_capacity must be >= 1"));
        }
        Ok(())
    }
}

impl Manager<ConfiguredSink> {
    /// Build the configured sink and settings
    #[instrument(name = "manager_from_config", skip(config), fields(sink = %config.sink.name))]
    pub fn from_config(config: &IngestConfig) -> Result<Self, RunError> {
        let sink = ConfiguredSink::from_config(&config.sink)?;
        Ok(Self::new(sink)
            .with_settings(config.pipeline.clone())
            .with_delimiter(config.source.delimiter_byte()))
    }

    /// Run the configured source with the configured worker count
    pub async fn run_configured(
        &self,
        config: &IngestConfig,
    ) -> Result<RunHandle<ConfiguredSink>, RunError> {
        self.run(&config.source.path, config.pipeline.worker_count)
            .await
    }
}
