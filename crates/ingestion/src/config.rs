//! Dispatch options and statistics

pub use contracts::ParseErrorPolicy;
use contracts::SourceConfig;

/// Dispatcher options
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    /// Field delimiter byte
    pub delimiter: u8,

    /// Malformed line handling
    pub parse_error_policy: ParseErrorPolicy,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            parse_error_policy: ParseErrorPolicy::Abort,
        }
    }
}

impl DispatchOptions {
    /// Create new dispatch options
    pub fn new(delimiter: u8, parse_error_policy: ParseErrorPolicy) -> Self {
        Self {
            delimiter,
            parse_error_policy,
        }
    }

    /// Options for a configured source
    pub fn from_source(source: &SourceConfig, parse_error_policy: ParseErrorPolicy) -> Self {
        Self::new(source.delimiter_byte(), parse_error_policy)
    }
}

/// Outcome of a clean dispatch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Data lines read (header excluded)
    pub lines_read: u64,

    /// Records pushed onto the intake queue
    pub dispatched: u64,

    /// Lines skipped under `SkipAndReport`
    pub skipped: u64,
}
