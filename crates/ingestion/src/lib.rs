//! # Ingestion
//!
//! Source dispatch module.
//!
//! Responsibilities:
//! - Read the delimited source (header skipped)
//! - Validate each line against the fixed 14-field schema
//! - Push `Record`s onto the bounded intake queue in source order (backpressure by suspension)
//! - Close the intake queue exactly once, on success, error or cancellation
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{read_source, DispatchOptions, Dispatcher};
//!
//! let (intake_tx, intake_rx) = async_channel::bounded(1000);
//! let (failure_tx, failure_rx) = async_channel::bounded(1000);
//! let bytes = read_source("./data.csv").await?;
//! let dispatcher = Dispatcher::new(DispatchOptions::default(), intake_tx, failure_tx, cancel);
//! let stats = dispatcher.run(std::io::Cursor::new(bytes)).await.into_result()?;
//! ```

mod config;
mod dispatcher;
mod error;
mod schema;

// Re-exports
pub use config::{DispatchOptions, DispatchStats, ParseErrorPolicy};
pub use contracts::Record;
pub use dispatcher::{read_source, DispatchReport, Dispatcher};
pub use error::{IngestionError, Result};
pub use schema::parse_record;
