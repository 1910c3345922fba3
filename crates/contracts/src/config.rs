//! IngestConfig - Config Loader output
//!
//! Describes one ingestion run: where the source lives, how the pipeline is sized,
//! and which sink receives the records.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::{Validate, ValidationError};

/// Default capacity of the intake and failure queues
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Default worker count
pub const DEFAULT_WORKER_COUNT: usize = 5;

/// Complete ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IngestConfig {
    /// Source settings
    #[validate(nested)]
    pub source: SourceConfig,

    /// Pipeline sizing and policies
    #[serde(default)]
    #[validate(nested)]
    pub pipeline: PipelineSettings,

    /// Output sink
    #[validate(nested)]
    pub sink: SinkConfig,
}

/// Source settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SourceConfig {
    /// Path of the delimited source file
    #[validate(length(min = 1, message = "source path cannot be empty"))]
    pub path: String,

    /// Field delimiter (single ASCII character)
    #[serde(default = "default_delimiter")]
    #[validate(custom(function = "validate_delimiter"))]
    pub delimiter: char,
}

fn default_delimiter() -> char {
    ','
}

fn validate_delimiter(delimiter: &char) -> Result<(), ValidationError> {
    if delimiter.is_ascii() && !delimiter.is_ascii_alphanumeric() && *delimiter != '"' {
        Ok(())
    } else {
        Err(ValidationError::new("delimiter")
            .with_message("delimiter must be a single ASCII punctuation or whitespace character".into()))
    }
}

impl SourceConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            delimiter: default_delimiter(),
        }
    }

    /// Delimiter as the byte the CSV reader expects
    pub fn delimiter_byte(&self) -> u8 {
        if self.delimiter.is_ascii() {
            self.delimiter as u8
        } else {
            b','
        }
    }
}

/// Pipeline sizing and policies
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PipelineSettings {
    /// Number of concurrent workers
    #[serde(default = "default_worker_count")]
    #[validate(range(min = 1, message = "worker_count must be >= 1"))]
    pub worker_count: usize,

    /// Intake queue capacity (dispatcher -> workers)
    #[serde(default = "default_queue_capacity")]
    #[validate(range(min = 1, message = "intake_capacity must be >= 1"))]
    pub intake_capacity: usize,

    /// Failure queue capacity (workers -> error collector)
    #[serde(default = "default_queue_capacity")]
    #[validate(range(min = 1, message = "failure_capacity must be >= 1"))]
    pub failure_capacity: usize,

    /// What to do with a malformed source line
    #[serde(default)]
    pub parse_error_policy: ParseErrorPolicy,
}

fn default_worker_count() -> usize {
    DEFAULT_WORKER_COUNT
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            intake_capacity: default_queue_capacity(),
            failure_capacity: default_queue_capacity(),
            parse_error_policy: ParseErrorPolicy::default(),
        }
    }
}

/// Malformed line handling
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorPolicy {
    /// Stop dispatch and fail the run
    #[default]
    Abort,
    /// Report the line as a failure and keep dispatching
    SkipAndReport,
}

/// Sink output configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SinkConfig {
    /// Sink name
    #[validate(length(min = 1, message = "sink name cannot be empty"))]
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl SinkConfig {
    pub fn new(name: impl Into<String>, sink_type: SinkType) -> Self {
        Self {
            name: name.into(),
            sink_type,
            params: HashMap::new(),
        }
    }
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// In-process document store
    Memory,
    /// JSON-lines file
    File,
    /// Log output only
    Log,
}

impl IngestConfig {
    /// Config with default pipeline settings
    pub fn new(source: SourceConfig, sink: SinkConfig) -> Self {
        Self {
            source,
            pipeline: PipelineSettings::default(),
            sink,
        }
    }
}
