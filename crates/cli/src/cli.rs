//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// fin-ingest - bulk loader for financial CSV data
#[derive(Parser, Debug)]
#[command(
    name = "fin-ingest",
    author,
    version,
    about = "Concurrent CSV ingestion pipeline for financial series data",
    long_about = "Reads a financial CSV source, dispatches every data line onto a bounded \n\
                  queue and persists the records through a pool of concurrent workers.\n\n\
                  Failed records are reported with their line number; the run continues."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "FIN_INGEST_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "FIN_INGEST_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the ingestion pipeline
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "ingest.toml", env = "FIN_INGEST_CONFIG")]
    pub config: PathBuf,

    /// Override the source CSV path from configuration
    #[arg(short, long, env = "FIN_INGEST_SOURCE")]
    pub source: Option<PathBuf>,

    /// Override the worker count from configuration
    #[arg(short, long, env = "FIN_INGEST_WORKERS")]
    pub workers: Option<usize>,

    /// Skip malformed lines (reported as failures) instead of aborting
    #[arg(long)]
    pub skip_bad_lines: bool,

    /// Run timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "FIN_INGEST_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running pipeline
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "FIN_INGEST_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "ingest.toml", env = "FIN_INGEST_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
