//! Ingestion metrics
//!
//! Prometheus counters for the pipeline stages, plus an in-memory failure aggregator
//! used for end-of-run summaries.

use std::collections::HashMap;

use contracts::{FailureReport, FailureStage};
use metrics::{counter, gauge, histogram};

/// Longest error text kept as an aggregation key
const MAX_ERROR_KEY_LEN: usize = 120;

/// Record one record the sink accepted
///
/// Rejections are counted by `record_failure_reported` with stage `persist`.
pub fn record_persisted(sink_name: &str) {
    counter!(
        "fin_ingest_records_persisted_total",
        "sink" => sink_name.to_string()
    )
    .increment(1);
}

/// Record sink call latency
pub fn record_persist_latency_ms(sink_name: &str, latency_ms: f64) {
    histogram!(
        "fin_ingest_persist_latency_ms",
        "sink" => sink_name.to_string()
    )
    .record(latency_ms);
}

/// Record one failure report reaching the collector
pub fn record_failure_reported(stage: FailureStage) {
    counter!(
        "fin_ingest_records_failed_total",
        "stage" => stage.as_str()
    )
    .increment(1);
}

/// Record the number of running workers
pub fn record_active_workers(count: usize) {
    gauge!("fin_ingest_active_workers").set(count as f64);
}

/// Failure aggregator
///
/// Aggregates failure reports in memory for summaries.
#[derive(Debug, Clone, Default)]
pub struct FailureAggregator {
    /// Total reports
    pub total: u64,

    /// Reports from the sink
    pub persist_failures: u64,

    /// Lines skipped by the dispatcher
    pub parse_failures: u64,

    /// Smallest failing line number
    pub first_line: Option<u64>,

    /// Largest failing line number
    pub last_line: Option<u64>,

    /// Occurrences per distinct error text
    pub error_counts: HashMap<String, u64>,
}

impl FailureAggregator {
    /// Create a new aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Update with one report
    pub fn update(&mut self, report: &FailureReport) {
        self.total += 1;
        match report.stage {
            FailureStage::Persist => self.persist_failures += 1,
            FailureStage::Parse => self.parse_failures += 1,
        }

        self.first_line = Some(
            self.first_line
                .map_or(report.line_number, |l| l.min(report.line_number)),
        );
        self.last_line = Some(
            self.last_line
                .map_or(report.line_number, |l| l.max(report.line_number)),
        );

        let mut key = report.error.to_string();
        if key.len() > MAX_ERROR_KEY_LEN {
            let mut cut = MAX_ERROR_KEY_LEN;
            while !key.is_char_boundary(cut) {
                cut -= 1;
            }
            key.truncate(cut);
        }
        *self.error_counts.entry(key).or_insert(0) += 1;
    }

    /// Generate summary
    pub fn summary(&self) -> FailureSummary {
        let mut top_errors: Vec<(String, u64)> = self
            .error_counts
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        top_errors.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_errors.truncate(5);

        FailureSummary {
            total: self.total,
            persist_failures: self.persist_failures,
            parse_failures: self.parse_failures,
            line_range: self.first_line.zip(self.last_line),
            top_errors,
        }
    }

    /// Reset statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Failure summary
#[derive(Debug, Clone, Default)]
pub struct FailureSummary {
    pub total: u64,
    pub persist_failures: u64,
    pub parse_failures: u64,
    pub line_range: Option<(u64, u64)>,
    pub top_errors: Vec<(String, u64)>,
}

impl std::fmt::Display for FailureSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Failure Summary ===")?;
        writeln!(f, "Total failures: {}", self.total)?;
        writeln!(f, "Persist failures: {}", self.persist_failures)?;
        writeln!(f, "Parse failures: {}", self.parse_failures)?;
        match self.line_range {
            Some((first, last)) => writeln!(f, "Lines: {first}..={last}")?,
            None => writeln!(f, "Lines: N/A")?,
        }

        if !self.top_errors.is_empty() {
            writeln!(f, "Most frequent errors:")?;
            for (error, count) in &self.top_errors {
                writeln!(f, "  {count} x {error}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ContractError;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test]
    fn test_persisted_counter_counts_successes_only() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        ::metrics::with_local_recorder(&recorder, || {
            record_persisted("mem");
            record_persisted("mem");
            record_failure_reported(FailureStage::Persist);
        });

        let rendered = handle.render();
        assert!(rendered.contains(r#"fin_ingest_records_persisted_total{sink="mem"} 2"#));
        assert!(rendered.contains(r#"fin_ingest_records_failed_total{stage="persist"} 1"#));
        assert!(!rendered.contains("status="));
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = FailureAggregator::new();

        aggregator.update(&FailureReport::persist(
            7,
            ContractError::sink_write("memory", "duplicate key"),
        ));
        aggregator.update(&FailureReport::persist(
            3,
            ContractError::sink_write("memory", "duplicate key"),
        ));
        aggregator.update(&FailureReport::parse(
            9,
            ContractError::Other("bad line".into()),
        ));

        assert_eq!(aggregator.total, 3);
        assert_eq!(aggregator.persist_failures, 2);
        assert_eq!(aggregator.parse_failures, 1);
        assert_eq!(aggregator.first_line, Some(3));
        assert_eq!(aggregator.last_line, Some(9));

        let summary = aggregator.summary();
        assert_eq!(summary.line_range, Some((3, 9)));
        assert_eq!(summary.top_errors[0].1, 2);
        assert!(summary.top_errors[0].0.contains("duplicate key"));
    }

    #[test]
    fn test_long_error_keys_truncated() {
        let mut aggregator = FailureAggregator::new();
        let long = "é".repeat(200);
        aggregator.update(&FailureReport::persist(1, ContractError::Other(long)));
        let key = aggregator.error_counts.keys().next().unwrap();
        assert!(key.len() <= MAX_ERROR_KEY_LEN);
    }

    #[test]
    fn test_summary_display() {
        let summary = FailureSummary {
            total: 2,
            persist_failures: 2,
            parse_failures: 0,
            line_range: Some((3, 7)),
            top_errors: vec![("sink 'memory' write error: boom".into(), 2)],
        };

        let output = format!("{}", summary);
        assert!(output.contains("Total failures: 2"));
        assert!(output.contains("Lines: 3..=7"));
        assert!(output.contains("2 x sink 'memory' write error: boom"));
    }

    #[test]
    fn test_reset() {
        let mut aggregator = FailureAggregator::new();
        aggregator.update(&FailureReport::persist(1, ContractError::Other("x".into())));
        aggregator.reset();
        assert_eq!(aggregator.total, 0);
        assert!(aggregator.summary().line_range.is_none());
    }
}
