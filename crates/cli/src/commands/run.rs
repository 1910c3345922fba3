//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::{IngestConfig, ParseErrorPolicy};
use manager::{Manager, RunReport};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use worker_pool::ConfiguredSink;

use crate::cli::RunArgs;
use crate::error::CliError;

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    // Validate config path
    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    // Load and parse configuration
    let mut config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_overrides(&mut config, args);
    config_loader::ConfigLoader::validate(&config)
        .map_err(|e| CliError::config_validation(e.to_string()))?;

    info!(
        source = %config.source.path,
        workers = config.pipeline.worker_count,
        intake_capacity = config.pipeline.intake_capacity,
        policy = ?config.pipeline.parse_error_policy,
        sink = %config.sink.name,
        sink_type = ?config.sink.sink_type,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::init_metrics(args.metrics_port)?;
    }

    let manager = Manager::from_config(&config).context("Failed to build pipeline")?;

    // Ctrl+C, SIGTERM and the timeout all cancel through the manager's token.
    let timeout = (args.timeout > 0).then(|| Duration::from_secs(args.timeout));
    let watcher = tokio::spawn(cancel_on_shutdown(manager.cancellation_token(), timeout));

    info!("Starting pipeline...");
    let result = execute(&manager, &config).await;
    watcher.abort();

    let report = result?;
    println!("\n{report}");

    if let Some(e) = &report.dispatch_error {
        return Err(CliError::run_incomplete(e.to_string()).into());
    }
    if let Some(e) = &report.flush_error {
        return Err(CliError::run_incomplete(format!("sink flush failed: {e}")).into());
    }

    if report.failed > 0 {
        warn!(
            failed = report.failed,
            dispatched = report.dispatched(),
            "Some records were not persisted"
        );
    }

    info!("fin-ingest finished");
    Ok(())
}

async fn execute(manager: &Manager<ConfiguredSink>, config: &IngestConfig) -> Result<RunReport> {
    let handle = manager
        .run_configured(config)
        .await
        .context("Pipeline failed to start")?;
    handle.wait().await.context("Pipeline execution failed")
}

fn apply_overrides(config: &mut IngestConfig, args: &RunArgs) {
    if let Some(ref source) = args.source {
        info!(source = %source.display(), "Overriding source from CLI");
        config.source.path = source.display().to_string();
    }
    if let Some(workers) = args.workers {
        info!(workers, "Overriding worker count from CLI");
        config.pipeline.worker_count = workers;
    }
    if args.skip_bad_lines {
        config.pipeline.parse_error_policy = ParseErrorPolicy::SkipAndReport;
    }
}

/// Cancel `token` on Ctrl+C, SIGTERM or after `timeout`
async fn cancel_on_shutdown(token: CancellationToken, timeout: Option<Duration>) {
    let deadline = async {
        match timeout {
            Some(t) => tokio::time::sleep(t).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = shutdown_signal() => warn!("Received shutdown signal, cancelling run..."),
        _ = deadline => warn!(timeout_secs = ?timeout.map(|t| t.as_secs()), "Timeout reached, cancelling run..."),
    }
    token.cancel();
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &IngestConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Source:");
    println!("  Path: {}", config.source.path);
    println!("  Delimiter: {:?}", config.source.delimiter);
    println!("\nPipeline:");
    println!("  Workers: {}", config.pipeline.worker_count);
    println!("  Intake capacity: {}", config.pipeline.intake_capacity);
    println!("  Failure capacity: {}", config.pipeline.failure_capacity);
    println!("  Parse errors: {:?}", config.pipeline.parse_error_policy);
    println!("\nSink:");
    println!("  - {} ({:?})", config.sink.name, config.sink.sink_type);
    for (key, value) in &config.sink.params {
        println!("    {key} = {value}");
    }
    println!();
}
