//! Dispatcher - reads the source and feeds the intake queue

use std::io::Read;
use std::path::Path;

use async_channel::Sender;
use contracts::{FailureReport, ParseErrorPolicy, Record};
use metrics::{counter, gauge};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::{DispatchOptions, DispatchStats};
use crate::error::{IngestionError, Result};
use crate::schema::parse_record;

/// Read the whole source up front
///
/// # Errors
/// `SourceUnavailable` when the path cannot be opened or read.
#[instrument(name = "dispatcher_read_source", skip(path), fields(path = %path.as_ref().display()))]
pub async fn read_source(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    tokio::fs::read(path)
        .await
        .map_err(|source| IngestionError::SourceUnavailable {
            path: path.display().to_string(),
            source,
        })
}

/// Result of one dispatch pass
#[derive(Debug)]
pub struct DispatchReport {
    /// Counters at the point dispatch stopped
    pub stats: DispatchStats,

    /// Terminal error, if dispatch did not reach end of input
    pub error: Option<IngestionError>,
}

impl DispatchReport {
    /// Collapse into a `Result`
    pub fn into_result(self) -> Result<DispatchStats> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.stats),
        }
    }
}

/// Sequential source reader
///
/// Holds the only intake `Sender`. The intake queue is closed exactly once, when
/// `run` returns, on every path.
pub struct Dispatcher {
    options: DispatchOptions,
    intake_tx: Sender<Record>,
    failure_tx: Sender<FailureReport>,
    cancel: CancellationToken,
}

impl Dispatcher {
    /// Create a new Dispatcher
    pub fn new(
        options: DispatchOptions,
        intake_tx: Sender<Record>,
        failure_tx: Sender<FailureReport>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            options,
            intake_tx,
            failure_tx,
            cancel,
        }
    }

    /// Dispatch every data line of `reader`, then close the intake queue
    #[instrument(
        name = "dispatcher_run",
        skip(self, reader),
        fields(policy = ?self.options.parse_error_policy)
    )]
    pub async fn run<R: Read>(self, reader: R) -> DispatchReport {
        let mut stats = DispatchStats::default();
        let result = self.dispatch_all(reader, &mut stats).await;

        // Sole sender: closing here releases every worker once the queue drains.
        self.intake_tx.close();

        match &result {
            Ok(()) => info!(
                lines = stats.lines_read,
                dispatched = stats.dispatched,
                skipped = stats.skipped,
                "Source exhausted, intake closed"
            ),
            Err(e) => warn!(
                lines = stats.lines_read,
                dispatched = stats.dispatched,
                error = %e,
                "Dispatch stopped early, intake closed"
            ),
        }

        DispatchReport {
            stats,
            error: result.err(),
        }
    }

    async fn dispatch_all<R: Read>(&self, reader: R, stats: &mut DispatchStats) -> Result<()> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.options.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let mut row = csv::StringRecord::new();

        loop {
            if self.cancel.is_cancelled() {
                return Err(IngestionError::Cancelled {
                    dispatched: stats.dispatched,
                });
            }

            let line_number = stats.lines_read + 1;
            let parsed = match reader.read_record(&mut row) {
                Ok(false) => return Ok(()),
                Ok(true) => parse_record(line_number, &row),
                Err(e) => Err(Self::classify_csv_error(e, stats.lines_read)),
            };
            stats.lines_read = line_number;

            match parsed {
                Ok(record) => {
                    self.push(record, stats).await?;
                }
                Err(e) if e.is_line_error() => self.handle_bad_line(e, stats).await?,
                Err(e) => return Err(e),
            }

            if stats.lines_read.is_multiple_of(1000) {
                debug!(lines = stats.lines_read, "Dispatcher progress");
            }
        }
    }

    fn classify_csv_error(e: csv::Error, lines_read: u64) -> IngestionError {
        if e.is_io_error() {
            match e.into_kind() {
                csv::ErrorKind::Io(source) => IngestionError::Read {
                    line_number: lines_read,
                    source,
                },
                other => IngestionError::MalformedLine {
                    line_number: lines_read + 1,
                    message: format!("{other:?}"),
                },
            }
        } else {
            IngestionError::MalformedLine {
                line_number: lines_read + 1,
                message: e.to_string(),
            }
        }
    }

    /// Push onto the bounded intake queue, suspending while it is full
    async fn push(&self, record: Record, stats: &mut DispatchStats) -> Result<()> {
        let line_number = record.line_number;
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                return Err(IngestionError::Cancelled {
                    dispatched: stats.dispatched,
                });
            }
            sent = self.intake_tx.send(record) => {
                sent.map_err(|_| IngestionError::IntakeClosed { line_number })?;
            }
        }

        stats.dispatched += 1;
        counter!("fin_ingest_records_dispatched_total").increment(1);
        gauge!("fin_ingest_intake_queue_len").set(self.intake_tx.len() as f64);
        Ok(())
    }

    async fn handle_bad_line(&self, error: IngestionError, stats: &mut DispatchStats) -> Result<()> {
        match self.options.parse_error_policy {
            ParseErrorPolicy::Abort => Err(error),
            ParseErrorPolicy::SkipAndReport => {
                let line_number = stats.lines_read;
                warn!(line_number, error = %error, "Skipping malformed line");
                stats.skipped += 1;

                let report = FailureReport::parse(line_number, error);
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => Err(IngestionError::Cancelled {
                        dispatched: stats.dispatched,
                    }),
                    // The collector outlives the dispatcher, so a send error means the
                    // run is being torn down; the report is dropped with it.
                    _ = self.failure_tx.send(report) => Ok(()),
                }
            }
        }
    }
}
