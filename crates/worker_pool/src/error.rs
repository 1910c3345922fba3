//! Worker pool error types

use thiserror::Error;

/// Worker-pool-specific errors
#[derive(Debug, Error)]
pub enum PoolError {
    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// A worker or the collector panicked
    #[error("task '{task}' panicked: {message}")]
    TaskPanicked { task: String, message: String },

    /// Sink error (from contract)
    #[error("sink error: {0}")]
    Contract(#[from] contracts::ContractError),
}

impl PoolError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn task_panicked(task: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TaskPanicked {
            task: task.into(),
            message: message.into(),
        }
    }
}
