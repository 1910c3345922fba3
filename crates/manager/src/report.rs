//! Run report

use std::fmt;
use std::time::Duration;

use contracts::{ContractError, FailureReport};
use ingestion::{DispatchStats, IngestionError};
use worker_pool::{FailureSummary, PoolError, WorkerSummary};

use crate::error::RunError;

/// Outcome of a finished run
#[derive(Debug)]
pub struct RunReport {
    /// Dispatcher counters
    pub dispatch: DispatchStats,

    /// Records the sink accepted
    pub persisted: u64,

    /// Records the sink rejected
    pub failed: u64,

    /// Per-worker breakdown, by worker id
    pub workers: Vec<WorkerSummary>,

    /// Retained failure reports, in the order the collector consumed them
    pub failures: Vec<FailureReport>,

    /// Failure reports consumed but not retained
    pub failures_discarded: u64,

    /// Aggregated failure counts
    pub failure_summary: FailureSummary,

    /// Why dispatch stopped early, if it did
    pub dispatch_error: Option<IngestionError>,

    /// Final sink flush failure; records counted as persisted may not be durable
    pub flush_error: Option<ContractError>,

    /// Wall time from `run` to the end of `wait`
    pub elapsed: Duration,
}

impl RunReport {
    /// Records pushed onto the intake queue
    pub fn dispatched(&self) -> u64 {
        self.dispatch.dispatched
    }

    /// Every failure report consumed (persist and skipped lines)
    pub fn failures_total(&self) -> u64 {
        self.failure_summary.total
    }

    /// Line numbers of the retained failure reports, ascending
    pub fn failed_lines(&self) -> Vec<u64> {
        let mut lines: Vec<_> = self.failures.iter().map(|f| f.line_number).collect();
        lines.sort_unstable();
        lines
    }

    /// Dispatch reached end of input
    pub fn is_complete(&self) -> bool {
        self.dispatch_error.is_none()
    }

    /// Records per second over the whole run
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.persisted as f64 / secs
        } else {
            0.0
        }
    }

    /// Fail with the dispatch error, then the flush error, if any
    pub fn into_result(mut self) -> Result<Self, RunError> {
        if let Some(e) = self.dispatch_error.take() {
            return Err(RunError::Dispatch(e));
        }
        match self.flush_error.take() {
            Some(e) => Err(PoolError::from(e).into()),
            None => Ok(self),
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Run Report ===")?;
        writeln!(f, "Duration: {:.2}s", self.elapsed.as_secs_f64())?;
        writeln!(f, "Lines read: {}", self.dispatch.lines_read)?;
        writeln!(f, "Dispatched: {}", self.dispatch.dispatched)?;
        writeln!(f, "Skipped: {}", self.dispatch.skipped)?;
        writeln!(f, "Persisted: {}", self.persisted)?;
        writeln!(f, "Failed: {} of {}", self.failed, self.dispatch.dispatched)?;
        writeln!(f, "Throughput: {:.1} records/s", self.throughput())?;
        if let Some(e) = &self.dispatch_error {
            writeln!(f, "Dispatch stopped: {e}")?;
        }
        if let Some(e) = &self.flush_error {
            writeln!(f, "Flush failed: {e}")?;
        }
        if self.failure_summary.total > 0 {
            write!(f, "{}", self.failure_summary)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ContractError;

    fn report() -> RunReport {
        RunReport {
            dispatch: DispatchStats {
                lines_read: 10,
                dispatched: 10,
                skipped: 0,
            },
            persisted: 8,
            failed: 2,
            workers: Vec::new(),
            failures: vec![
                FailureReport::persist(7, ContractError::Other("x".into())),
                FailureReport::persist(3, ContractError::Other("x".into())),
            ],
            failures_discarded: 0,
            failure_summary: FailureSummary {
                total: 2,
                persist_failures: 2,
                ..Default::default()
            },
            dispatch_error: None,
            flush_error: None,
            elapsed: Duration::from_secs(2),
        }
    }

    #[test]
    fn test_failed_lines_sorted() {
        assert_eq!(report().failed_lines(), vec![3, 7]);
    }

    #[test]
    fn test_throughput() {
        assert!((report().throughput() - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_into_result() {
        assert!(report().into_result().is_ok());

        let mut cancelled = report();
        cancelled.dispatch_error = Some(IngestionError::Cancelled { dispatched: 4 });
        assert!(!cancelled.is_complete());
        assert!(cancelled.into_result().unwrap_err().is_cancelled());

        let mut unflushed = report();
        unflushed.flush_error = Some(ContractError::sink_write("file", "disk full"));
        assert!(unflushed.is_complete());
        assert!(unflushed.to_string().contains("Flush failed"));
        assert!(matches!(
            unflushed.into_result(),
            Err(RunError::Pool(PoolError::Contract(_)))
        ));
    }

    #[test]
    fn test_display() {
        let output = report().to_string();
        assert!(output.contains("Persisted: 8"));
        assert!(output.contains("Failed: 2 of 10"));
        assert!(output.contains("Total failures: 2"));
    }
}
