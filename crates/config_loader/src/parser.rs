//! Configuration parsing
//!
//! TOML (primary) and JSON.

use contracts::{ContractError, IngestConfig};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (recommended)
    Toml,
    /// JSON
    Json,
}

impl ConfigFormat {
    /// Infer format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse TOML configuration
pub fn parse_toml(content: &str) -> Result<IngestConfig, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse JSON configuration
pub fn parse_json(content: &str) -> Result<IngestConfig, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse by format
pub fn parse(content: &str, format: ConfigFormat) -> Result<IngestConfig, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ParseErrorPolicy, SinkType};

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
[source]
path = "./data.csv"

[sink]
name = "store"
sink_type = "memory"
"#;
        let result = parse_toml(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.source.path, "./data.csv");
        assert_eq!(config.source.delimiter, ',');
        assert_eq!(config.sink.sink_type, SinkType::Memory);
        assert_eq!(config.pipeline.worker_count, 5);
    }

    #[test]
    fn test_parse_toml_full() {
        let content = r#"
[source]
path = "./data.csv"
delimiter = ";"

[pipeline]
worker_count = 8
intake_capacity = 200
failure_capacity = 50
parse_error_policy = "skip_and_report"

[sink]
name = "jsonl"
sink_type = "file"
[sink.params]
path = "./out/financial_data.jsonl"
"#;
        let config = parse_toml(content).unwrap();
        assert_eq!(config.source.delimiter, ';');
        assert_eq!(config.pipeline.worker_count, 8);
        assert_eq!(config.pipeline.intake_capacity, 200);
        assert_eq!(config.pipeline.failure_capacity, 50);
        assert_eq!(
            config.pipeline.parse_error_policy,
            ParseErrorPolicy::SkipAndReport
        );
        assert_eq!(
            config.sink.params.get("path").map(String::as_str),
            Some("./out/financial_data.jsonl")
        );
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "source": { "path": "data.csv" },
            "pipeline": { "worker_count": 2 },
            "sink": { "name": "log", "sink_type": "log" }
        }"#;
        let result = parse_json(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        assert_eq!(result.unwrap().pipeline.worker_count, 2);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_parse_unknown_sink_type() {
        let content = r#"
[source]
path = "data.csv"

[sink]
name = "mongo"
sink_type = "mongodb"
"#;
        assert!(matches!(
            parse_toml(content),
            Err(ContractError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
