//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{IngestConfig, ParseErrorPolicy, SinkType};
use serde::Serialize;
use std::path::Path;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    source: String,
    worker_count: usize,
    intake_capacity: usize,
    failure_capacity: usize,
    parse_error_policy: String,
    sink: String,
    sink_type: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(&args.config);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(path: &Path) -> ValidationResult {
    let config_path = path.display().to_string();

    // Check file exists
    if !path.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", path.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(path) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    source: config.source.path.clone(),
                    worker_count: config.pipeline.worker_count,
                    intake_capacity: config.pipeline.intake_capacity,
                    failure_capacity: config.pipeline.failure_capacity,
                    parse_error_policy: format!("{:?}", config.pipeline.parse_error_policy),
                    sink: config.sink.name.clone(),
                    sink_type: format!("{:?}", config.sink.sink_type),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &IngestConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if !Path::new(&config.source.path).exists() {
        warnings.push(format!(
            "Source '{}' does not exist yet - run will fail unless it is created",
            config.source.path
        ));
    }

    match config.sink.sink_type {
        SinkType::Log => {
            warnings.push("Log sink configured - documents are logged, not stored".to_string())
        }
        SinkType::Memory => warnings
            .push("Memory sink configured - documents are discarded when the run exits".to_string()),
        SinkType::File => {}
    }

    if config.pipeline.intake_capacity < config.pipeline.worker_count {
        warnings.push(format!(
            "intake_capacity ({}) is below worker_count ({}) - workers will often idle",
            config.pipeline.intake_capacity, config.pipeline.worker_count
        ));
    }

    if config.pipeline.parse_error_policy == ParseErrorPolicy::SkipAndReport {
        warnings.push("Malformed lines will be skipped and reported, not fatal".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Source: {}", summary.source);
            println!("  Workers: {}", summary.worker_count);
            println!(
                "  Queues: intake {} / failure {}",
                summary.intake_capacity, summary.failure_capacity
            );
            println!("  Parse errors: {}", summary.parse_error_policy);
            println!("  Sink: {} ({})", summary.sink, summary.sink_type);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
