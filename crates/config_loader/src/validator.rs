//! Configuration validation
//!
//! Rules:
//! - derive rules declared on the config types (worker_count >= 1, capacities >= 1,
//!   non-empty source path and sink name, ASCII delimiter)
//! - file sink `path` param, when given, is not empty
//! - failure queue can hold at least one report per worker

use std::collections::BTreeMap;

use contracts::{ContractError, IngestConfig, SinkType};
use ::validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Validate an IngestConfig
///
/// Returns the first error encountered (ordered by field path), or Ok(()).
pub fn validate(config: &IngestConfig) -> Result<(), ContractError> {
    validate_declared_rules(config)?;
    validate_sink_params(config)?;
    validate_queue_sizing(config)?;
    Ok(())
}

fn validate_declared_rules(config: &IngestConfig) -> Result<(), ContractError> {
    let Err(errors) = config.validate() else {
        return Ok(());
    };

    let mut flat = BTreeMap::new();
    flatten_errors("", &errors, &mut flat);

    match flat.into_iter().next() {
        Some((field, message)) => Err(ContractError::config_validation(field, message)),
        None => Err(ContractError::config_validation("config", "invalid configuration")),
    }
}

/// Collect `path -> message` for every leaf error
fn flatten_errors(prefix: &str, errors: &ValidationErrors, out: &mut BTreeMap<String, String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                if let Some(first) = field_errors.first() {
                    let message = first
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed '{}' check", first.code));
                    out.insert(path, message);
                }
            }
            ValidationErrorsKind::Struct(nested) => flatten_errors(&path, nested, out),
            ValidationErrorsKind::List(items) => {
                for (idx, nested) in items {
                    flatten_errors(&format!("{path}[{idx}]"), nested, out);
                }
            }
        }
    }
}

/// Validate sink params
fn validate_sink_params(config: &IngestConfig) -> Result<(), ContractError> {
    if config.sink.sink_type == SinkType::File {
        if let Some(path) = config.sink.params.get("path") {
            if path.trim().is_empty() {
                return Err(ContractError::config_validation(
                    "sink.params.path",
                    "file sink path cannot be empty",
                ));
            }
        }
    }
    Ok(())
}

/// Validate queue sizing
fn validate_queue_sizing(config: &IngestConfig) -> Result<(), ContractError> {
    let pipeline = &config.pipeline;
    if pipeline.failure_capacity < pipeline.worker_count {
        return Err(ContractError::config_validation(
            "pipeline.failure_capacity",
            format!(
                "failure_capacity ({}) must be >= worker_count ({})",
                pipeline.failure_capacity, pipeline.worker_count
            ),
        ));
    }
    Ok(())
}
