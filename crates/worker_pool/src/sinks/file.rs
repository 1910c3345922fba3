//! FileSink - appends documents to a JSON-lines file

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::Utc;
use contracts::{ContractError, FinancialData, RecordSink};
use serde::Serialize;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;
use tracing::{debug, error, instrument};
use uuid::Uuid;

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output file (created with its parent directories)
    pub path: PathBuf,
}

impl FileSinkConfig {
    pub const DEFAULT_PATH: &'static str = "./output/financial_data.jsonl";

    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let path = params
            .get("path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_PATH));

        Self { path }
    }
}

/// One output line
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FileEntry<'a> {
    id: &'a str,
    #[serde(flatten)]
    data: &'a FinancialData,
    ingested_at: String,
}

/// Sink that writes one JSON object per line
///
/// Writes from concurrent workers are serialized through a single buffered writer;
/// `flush` pushes the buffer to disk.
pub struct FileSink {
    name: String,
    path: PathBuf,
    writer: Mutex<BufWriter<tokio::fs::File>>,
}

impl FileSink {
    /// Create a new FileSink, appending to an existing file
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)?;

        Ok(Self {
            name: name.into(),
            path: config.path,
            writer: Mutex::new(BufWriter::new(tokio::fs::File::from_std(file))),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        Self::new(name, FileSinkConfig::from_params(params))
    }

    /// Output file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, id: &str, data: &FinancialData) -> std::io::Result<()> {
        let entry = FileEntry {
            id,
            data,
            ingested_at: Utc::now().to_rfc3339(),
        };
        let mut line = serde_json::to_vec(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await
    }
}

impl RecordSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "file_sink_create", skip(self, data), fields(sink = %self.name))]
    async fn create(&self, data: &FinancialData) -> Result<String, ContractError> {
        let id = Uuid::new_v4().to_string();
        self.append(&id, data).await.map_err(|e| {
            error!(sink = %self.name, error = %e, "Write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })?;
        Ok(id)
    }

    #[instrument(name = "file_sink_flush", skip(self), fields(sink = %self.name))]
    async fn flush(&self) -> Result<(), ContractError> {
        let mut writer = self.writer.lock().await;
        writer
            .flush()
            .await
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        debug!(sink = %self.name, path = %self.path.display(), "FileSink flushed");
        Ok(())
    }
}
