//! # Worker Pool
//!
//! Persistence stage of the pipeline.
//!
//! Responsibilities:
//! - Run N workers that pull `Record`s from the shared intake queue
//! - Call the sink once per record; a rejected record becomes one `FailureReport`
//! - Drain the failure queue in the `ErrorCollector`
//! - Provide the built-in sinks (memory, JSON-lines file, log)

pub mod collector;
pub mod error;
pub mod metrics;
pub mod pool;
pub mod sinks;

pub use collector::{CollectorSummary, ErrorCollector, DEFAULT_RETAINED_FAILURES};
pub use contracts::{FailureReport, Record, RecordSink};
pub use error::PoolError;
pub use metrics::{MetricsSnapshot, PoolMetrics};
pub use observability::FailureSummary;
pub use pool::{WorkerPool, WorkerSummary};
pub use sinks::{ConfiguredSink, FileSink, FileSinkConfig, LogSink, MemorySink};
