//! # Integration Tests
//!
//! End-to-end tests across the workspace crates.
//!
//! Covers:
//! - Source file -> Dispatcher -> WorkerPool -> sink, with the Manager's completion contract
//! - Failure isolation and line-number reporting
//! - Backpressure, parse policies, cancellation
//! - Config-driven runs through `config_loader`

#[cfg(test)]
mod fixtures {
    use std::io::Write;
    use std::sync::Mutex;
    use std::time::Duration;

    use contracts::{ContractError, FinancialData, RecordSink};
    use tempfile::NamedTempFile;

    pub const HEADER: &str = "Series_reference,Period,Data_value,Suppressed,STATUS,UNITS,Magnitude,Subject,Group,Series_title_1,Series_title_2,Series_title_3,Series_title_4,Series_title_5";

    /// 14 non-empty fields; the series reference encodes the data line number
    pub fn fields(n: u64) -> [String; 14] {
        [
            format!("BDCQ.SEA{n}"),
            format!("2020.{:02}", n % 12 + 1),
            format!("{n}.25"),
            "N".to_string(),
            "F".to_string(),
            "Number".to_string(),
            "0".to_string(),
            "Business Data Collection - BDC".to_string(),
            "Industry by employment variable".to_string(),
            "Filled jobs".to_string(),
            "Agriculture, Forestry and Fishing".to_string(),
            "Actual".to_string(),
            "Quarterly".to_string(),
            format!("Series {n}"),
        ]
    }

    /// One CSV line; fields containing the delimiter are quoted
    pub fn line(n: u64) -> String {
        fields(n)
            .iter()
            .map(|f| {
                if f.contains(',') {
                    format!("\"{f}\"")
                } else {
                    f.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn expected(n: u64) -> FinancialData {
        FinancialData::from_fields(fields(n))
    }

    pub fn csv_with(lines: &[String]) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        for l in lines {
            writeln!(file, "{l}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    pub fn csv(count: u64) -> NamedTempFile {
        csv_with(&(1..=count).map(line).collect::<Vec<_>>())
    }

    /// Data line number encoded in the series reference
    pub fn line_of(data: &FinancialData) -> u64 {
        data.series_reference
            .trim_start_matches("BDCQ.SEA")
            .parse()
            .unwrap()
    }

    /// Test double: records call order, fails chosen lines, optional delay
    #[derive(Default)]
    pub struct ScriptedSink {
        pub fail_lines: Vec<u64>,
        pub delay: Option<Duration>,
        pub stored: Mutex<Vec<FinancialData>>,
    }

    impl ScriptedSink {
        pub fn failing_on(lines: &[u64]) -> Self {
            Self {
                fail_lines: lines.to_vec(),
                ..Default::default()
            }
        }

        pub fn slow(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Default::default()
            }
        }

        pub fn stored_lines(&self) -> Vec<u64> {
            self.stored.lock().unwrap().iter().map(line_of).collect()
        }
    }

    impl RecordSink for ScriptedSink {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn create(&self, data: &FinancialData) -> Result<String, ContractError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let line = line_of(data);
            if self.fail_lines.contains(&line) {
                return Err(ContractError::sink_write(
                    "scripted",
                    format!("rejected line {line}"),
                ));
            }
            let mut stored = self.stored.lock().unwrap();
            stored.push(data.clone());
            Ok(format!("doc-{line}"))
        }

        async fn flush(&self) -> Result<(), ContractError> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{
        DocumentStore, FailureStage, FinancialPatch, Pagination, ParseErrorPolicy,
        PipelineSettings,
    };
    use ingestion::IngestionError;
    use manager::{Manager, RunError};
    use tokio::time::timeout;
    use worker_pool::MemorySink;

    use crate::fixtures::*;

    /// 1 header + 10 lines, 5 workers: every line stored with its fields verbatim
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_e2e_ten_lines_five_workers() {
        let file = csv(10);
        let sink = MemorySink::new("mem");
        let manager = Manager::new(sink.clone());

        let report = manager.run_to_completion(file.path(), 5).await.unwrap();
        assert_eq!(report.dispatched(), 10);
        assert_eq!(report.persisted, 10);
        assert_eq!(report.failures_total(), 0);

        let mut stored = sink.snapshot().await;
        assert_eq!(stored.len(), 10);
        stored.sort_by_key(|d| line_of(&d.data));
        for (i, doc) in stored.iter().enumerate() {
            let n = i as u64 + 1;
            assert_eq!(doc.data, expected(n));
            assert!(doc.data.fields().iter().all(|f| !f.is_empty()));
        }
    }

    /// Sink fails lines 3 and 7: eight stored, exactly two reports
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_e2e_failures_isolated_to_their_lines() {
        let file = csv(10);
        let sink = Arc::new(ScriptedSink::failing_on(&[3, 7]));
        let manager = Manager::with_shared_sink(Arc::clone(&sink));

        let report = manager.run_to_completion(file.path(), 5).await.unwrap();
        assert_eq!(report.persisted, 8);
        assert_eq!(report.failed, 2);
        assert_eq!(report.failed_lines(), vec![3, 7]);
        assert!(report
            .failures
            .iter()
            .all(|f| f.stage == FailureStage::Persist));

        let mut stored = sink.stored_lines();
        stored.sort_unstable();
        assert_eq!(stored, vec![1, 2, 4, 5, 6, 8, 9, 10]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_single_worker_sees_source_order() {
        let file = csv(30);
        let sink = Arc::new(ScriptedSink::default());
        let manager = Manager::with_shared_sink(Arc::clone(&sink));

        manager.run_to_completion(file.path(), 1).await.unwrap();

        let lines = sink.stored_lines();
        assert_eq!(lines.len(), 30);
        assert!(lines.windows(2).all(|w| w[0] <= w[1]));
    }

    /// Intake capacity far below the line count still processes everything
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_backpressure_processes_all_lines() {
        let file = csv(50);
        let sink = Arc::new(ScriptedSink::slow(Duration::from_millis(2)));
        let manager =
            Manager::with_shared_sink(Arc::clone(&sink)).with_settings(PipelineSettings {
                intake_capacity: 2,
                failure_capacity: 2,
                ..Default::default()
            });

        let report = timeout(
            Duration::from_secs(10),
            manager.run_to_completion(file.path(), 3),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(report.persisted, 50);
        assert_eq!(sink.stored_lines().len(), 50);
    }

    /// Failure queue smaller than the failure count does not stall the run
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_full_failure_queue_does_not_stall() {
        let file = csv(20);
        let failing: Vec<u64> = (1..=20).filter(|n| n % 2 == 0).collect();
        let sink = Arc::new(ScriptedSink::failing_on(&failing));
        let manager =
            Manager::with_shared_sink(Arc::clone(&sink)).with_settings(PipelineSettings {
                intake_capacity: 4,
                failure_capacity: 4,
                ..Default::default()
            });

        let report = timeout(
            Duration::from_secs(10),
            manager.run_to_completion(file.path(), 4),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(report.persisted, 10);
        assert_eq!(report.failed_lines(), failing);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_parse_abort_reports_line_and_keeps_prior_records() {
        let mut lines: Vec<String> = (1..=5).map(line).collect();
        lines.insert(3, "BDCQ.SEA99,2020.01,1.0".to_string());
        let file = csv_with(&lines);

        let sink = MemorySink::new("mem");
        let manager = Manager::new(sink.clone());

        let err = manager.run_to_completion(file.path(), 2).await.unwrap_err();
        match err {
            RunError::Dispatch(IngestionError::FieldCount {
                line_number,
                expected,
                found,
            }) => {
                assert_eq!(line_number, 4);
                assert_eq!(expected, 14);
                assert_eq!(found, 3);
            }
            other => panic!("unexpected error: {other}"),
        }

        // No rollback: the three lines ahead of the bad one are stored.
        assert_eq!(sink.count().await.unwrap(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_skip_policy_continues_past_bad_line() {
        let mut lines: Vec<String> = (1..=5).map(line).collect();
        lines.insert(2, "only,two".to_string());
        let file = csv_with(&lines);

        let sink = MemorySink::new("mem");
        let manager = Manager::new(sink.clone()).with_settings(PipelineSettings {
            parse_error_policy: ParseErrorPolicy::SkipAndReport,
            ..Default::default()
        });

        let report = manager.run_to_completion(file.path(), 2).await.unwrap();
        assert_eq!(report.dispatch.lines_read, 6);
        assert_eq!(report.dispatch.skipped, 1);
        assert_eq!(report.persisted, 5);
        assert_eq!(report.failed_lines(), vec![3]);
        assert_eq!(report.failures[0].stage, FailureStage::Parse);
        assert_eq!(sink.count().await.unwrap(), 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancellation_closes_queues_cleanly() {
        let file = csv(500);
        let sink = Arc::new(ScriptedSink::slow(Duration::from_millis(10)));
        let manager =
            Manager::with_shared_sink(Arc::clone(&sink)).with_settings(PipelineSettings {
                intake_capacity: 2,
                ..Default::default()
            });

        let token = manager.cancellation_token();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        });

        let handle = timeout(Duration::from_secs(5), manager.run(file.path(), 2))
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(
            handle.dispatch_error(),
            Some(IngestionError::Cancelled { .. })
        ));

        let report = timeout(Duration::from_secs(5), handle.wait())
            .await
            .unwrap()
            .unwrap();
        assert!(report.workers.iter().all(|w| w.cancelled));
        assert!(report.persisted < 500);
        assert_eq!(report.persisted as usize, sink.stored_lines().len());
    }

    #[tokio::test]
    async fn test_missing_source_is_fatal() {
        let sink = Arc::new(ScriptedSink::default());
        let manager = Manager::with_shared_sink(Arc::clone(&sink));

        let err = manager
            .run_to_completion("/no/such/source.csv", 3)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RunError::Dispatch(IngestionError::SourceUnavailable { .. })
        ));
        assert!(sink.stored_lines().is_empty());
    }

    #[tokio::test]
    async fn test_header_only_source_completes() {
        let file = csv(0);
        let manager = Manager::new(MemorySink::new("mem"));

        let report = manager.run_to_completion(file.path(), 3).await.unwrap();
        assert_eq!(report.dispatched(), 0);
        assert_eq!(report.persisted, 0);
        assert!(report.is_complete());
    }

    /// After a run the memory sink serves the document-store operations
    #[tokio::test]
    async fn test_store_operations_after_ingest() {
        let file = csv(7);
        let sink = MemorySink::new("mem");
        let manager = Manager::new(sink.clone());
        manager.run_to_completion(file.path(), 1).await.unwrap();

        let first_page = sink.list(Pagination::new(0, 5)).await.unwrap();
        let second_page = sink.list(Pagination::new(1, 5)).await.unwrap();
        assert_eq!(first_page.len(), 5);
        assert_eq!(second_page.len(), 2);

        // Single worker: insertion order is source order.
        assert_eq!(first_page[0].data, expected(1));

        let id = first_page[0].id.clone();
        let patch = FinancialPatch {
            data_value: Some("42.0".into()),
            ..Default::default()
        };
        sink.update(&id, &patch).await.unwrap();
        assert_eq!(sink.find_by_id(&id).await.unwrap().data.data_value, "42.0");

        sink.delete(&id).await.unwrap();
        assert!(sink.find_by_id(&id).await.unwrap_err().is_not_found());
        assert_eq!(sink.count().await.unwrap(), 6);
    }
}

#[cfg(test)]
mod config_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use manager::Manager;
    use tempfile::tempdir;

    use crate::fixtures::*;

    fn toml_config(source: &str, output: &str, workers: usize) -> String {
        format!(
            r#"
[source]
path = "{source}"

[pipeline]
worker_count = {workers}
intake_capacity = 8
failure_capacity = 16

[sink]
name = "jsonl"
sink_type = "file"

[sink.params]
path = "{output}"
"#
        )
    }

    /// TOML config -> Manager::from_config -> file sink output
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_config_driven_file_sink_run() {
        let file = csv(12);
        let dir = tempdir().unwrap();
        let output = dir.path().join("out").join("records.jsonl");

        let content = toml_config(
            &file.path().display().to_string(),
            &output.display().to_string(),
            4,
        );
        let config = ConfigLoader::load_from_str(&content, ConfigFormat::Toml).unwrap();

        let manager = Manager::from_config(&config).unwrap();
        let report = manager
            .run_configured(&config)
            .await
            .unwrap()
            .wait()
            .await
            .unwrap();
        assert_eq!(report.persisted, 12);
        assert_eq!(report.workers.len(), 4);

        let written = std::fs::read_to_string(&output).unwrap();
        let mut refs: Vec<String> = written
            .lines()
            .map(|l| {
                let value: serde_json::Value = serde_json::from_str(l).unwrap();
                assert!(value["id"].is_string());
                assert_eq!(value["seriesTitle2"], "Agriculture, Forestry and Fishing");
                value["seriesReference"].as_str().unwrap().to_string()
            })
            .collect();
        refs.sort();
        let mut expected_refs: Vec<String> = (1..=12).map(|n| format!("BDCQ.SEA{n}")).collect();
        expected_refs.sort();
        assert_eq!(refs, expected_refs);
    }

    #[test]
    fn test_config_roundtrip_keeps_pipeline_settings() {
        let content = toml_config("data.csv", "out.jsonl", 6);
        let config = ConfigLoader::load_from_str(&content, ConfigFormat::Toml).unwrap();

        let json = ConfigLoader::to_json(&config).unwrap();
        let back = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(back.pipeline.worker_count, 6);
        assert_eq!(back.sink.params.get("path").unwrap(), "out.jsonl");
    }

    #[test]
    fn test_config_rejects_undersized_failure_queue() {
        let content = toml_config("data.csv", "out.jsonl", 32);
        assert!(ConfigLoader::load_from_str(&content, ConfigFormat::Toml).is_err());
    }
}
