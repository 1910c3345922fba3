//! Run error types

use ingestion::IngestionError;
use thiserror::Error;
use worker_pool::PoolError;

/// Errors surfaced to the caller of a run
#[derive(Debug, Error)]
pub enum RunError {
    /// Rejected before anything started
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Source unavailable, parse failure or cancellation
    #[error(transparent)]
    Dispatch(#[from] IngestionError),

    /// A background task failed, or the final sink flush did
    #[error(transparent)]
    Pool(#[from] PoolError),
}

impl RunError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Whether the run stopped because it was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Dispatch(IngestionError::Cancelled { .. }))
    }
}
