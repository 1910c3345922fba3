//! Sink implementations
//!
//! Contains MemorySink, FileSink, and LogSink, plus `ConfiguredSink` for building
//! one from a `SinkConfig`.

mod file;
mod log;
mod memory;

pub use self::file::{FileSink, FileSinkConfig};
pub use self::log::LogSink;
pub use self::memory::MemorySink;

use contracts::{ContractError, FinancialData, RecordSink, SinkConfig, SinkType};
use tracing::instrument;

use crate::error::PoolError;

/// A sink selected by configuration
pub enum ConfiguredSink {
    Memory(MemorySink),
    File(FileSink),
    Log(LogSink),
}

impl ConfiguredSink {
    /// Create the sink described by `config`
    #[instrument(
        name = "sink_from_config",
        skip(config),
        fields(sink = %config.name, sink_type = ?config.sink_type)
    )]
    pub fn from_config(config: &SinkConfig) -> Result<Self, PoolError> {
        match config.sink_type {
            SinkType::Memory => Ok(Self::Memory(MemorySink::new(&config.name))),
            SinkType::File => FileSink::from_params(&config.name, &config.params)
                .map(Self::File)
                .map_err(|e| PoolError::sink_creation(&config.name, e.to_string())),
            SinkType::Log => Ok(Self::Log(LogSink::new(&config.name))),
        }
    }
}

impl RecordSink for ConfiguredSink {
    fn name(&self) -> &str {
        match self {
            Self::Memory(s) => s.name(),
            Self::File(s) => s.name(),
            Self::Log(s) => s.name(),
        }
    }

    async fn create(&self, data: &FinancialData) -> Result<String, ContractError> {
        match self {
            Self::Memory(s) => s.create(data).await,
            Self::File(s) => s.create(data).await,
            Self::Log(s) => s.create(data).await,
        }
    }

    async fn flush(&self) -> Result<(), ContractError> {
        match self {
            Self::Memory(s) => s.flush().await,
            Self::File(s) => s.flush().await,
            Self::Log(s) => s.flush().await,
        }
    }
}
