//! Ingestion error types

use contracts::FIELD_COUNT;
use thiserror::Error;

/// Errors that end (or, under the skip policy, skip) dispatch
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Source could not be opened or read
    #[error("source '{path}' unavailable: {source}")]
    SourceUnavailable {
        /// Source path
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Data line has the wrong number of fields
    #[error("line {line_number}: expected {expected} fields, found {found}")]
    FieldCount {
        /// 1-based data line number
        line_number: u64,
        /// Required field count
        expected: usize,
        /// Actual field count
        found: usize,
    },

    /// Data line could not be decoded
    #[error("line {line_number}: malformed record: {message}")]
    MalformedLine {
        /// 1-based data line number
        line_number: u64,
        /// Decoder message
        message: String,
    },

    /// I/O failure while reading the source
    #[error("read error after line {line_number}: {source}")]
    Read {
        /// Last successfully read data line
        line_number: u64,
        #[source]
        source: std::io::Error,
    },

    /// Run was cancelled
    #[error("dispatch cancelled after {dispatched} records")]
    Cancelled {
        /// Records pushed before cancellation
        dispatched: u64,
    },

    /// Every worker is gone
    #[error("intake queue closed by consumers at line {line_number}")]
    IntakeClosed {
        /// Line that could not be pushed
        line_number: u64,
    },
}

impl IngestionError {
    pub fn field_count(line_number: u64, found: usize) -> Self {
        Self::FieldCount {
            line_number,
            expected: FIELD_COUNT,
            found,
        }
    }

    /// Whether this error concerns one line only (eligible for skip-and-report)
    pub fn is_line_error(&self) -> bool {
        matches!(self, Self::FieldCount { .. } | Self::MalformedLine { .. })
    }
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
