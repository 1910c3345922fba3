//! FailureReport - Worker output to the error collector

use std::fmt;

/// Boxed error carried by a failure report
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Where the failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureStage {
    /// Sink rejected the record
    Persist,
    /// Line was skipped by the dispatcher (skip-and-report policy)
    Parse,
}

impl FailureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Persist => "persist",
            Self::Parse => "parse",
        }
    }
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failed record
///
/// Consumed exactly once by the error collector; never retried.
#[derive(Debug)]
pub struct FailureReport {
    /// 1-based data line number (header excluded)
    pub line_number: u64,

    /// Failure stage
    pub stage: FailureStage,

    /// Underlying error
    pub error: BoxError,
}

impl FailureReport {
    /// Report a persist failure
    pub fn persist(line_number: u64, error: impl Into<BoxError>) -> Self {
        Self {
            line_number,
            stage: FailureStage::Persist,
            error: error.into(),
        }
    }

    /// Report a skipped line
    pub fn parse(line_number: u64, error: impl Into<BoxError>) -> Self {
        Self {
            line_number,
            stage: FailureStage::Parse,
            error: error.into(),
        }
    }
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {} ({} failure): {}",
            self.line_number, self.stage, self.error
        )
    }
}
