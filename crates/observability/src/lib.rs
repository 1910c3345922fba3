//! # Observability
//!
//! Log subscriber setup, the Prometheus listener and the pipeline's metric helpers.
//!
//! ```ignore
//! observability::init_logging(&LoggingConfig::new(LogFormat::Compact, "debug"))?;
//! observability::init_metrics(9100)?;
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use crate::metrics::{
    record_active_workers, record_failure_reported, record_persist_latency_ms, record_persisted,
    FailureAggregator, FailureSummary,
};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event
    Json,
    /// Multi-line, human readable
    Pretty,
    /// Single line
    Compact,
}

/// Log subscriber settings
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Filter used when `RUST_LOG` is unset or invalid
    pub default_level: String,
}

impl LoggingConfig {
    pub fn new(format: LogFormat, default_level: impl Into<String>) -> Self {
        Self {
            format,
            default_level: default_level.into(),
        }
    }
}

/// Filter level for `-q` / `-v` counts; quiet wins
pub fn level_for(verbose: u8, quiet: bool) -> &'static str {
    match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    }
}

/// Install the global tracing subscriber
///
/// # Errors
/// Fails when a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_level));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_thread_ids(true),
            )
            .try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_target(false))
            .try_init(),
    };
    installed.context("Failed to initialize tracing subscriber")?;

    tracing::debug!(format = ?config.format, level = %config.default_level, "Logging initialized");
    Ok(())
}

/// Serve Prometheus metrics on `0.0.0.0:port`
///
/// Must be called from inside a tokio runtime.
pub fn init_metrics(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .with_context(|| format!("Failed to start metrics listener on port {port}"))?;

    tracing::info!(port, "Prometheus metrics endpoint listening");
    Ok(())
}
