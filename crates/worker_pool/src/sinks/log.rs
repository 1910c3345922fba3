//! LogSink - logs document summaries via tracing

use contracts::{ContractError, FinancialData, RecordSink};
use tracing::{info, instrument};
use uuid::Uuid;

/// Sink that only logs, for dry runs
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl RecordSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "log_sink_create", skip(self, data), fields(sink = %self.name))]
    async fn create(&self, data: &FinancialData) -> Result<String, ContractError> {
        let id = Uuid::new_v4().to_string();
        info!(
            sink = %self.name,
            id = %id,
            series_reference = %data.series_reference,
            period = %data.period,
            data_value = %data.data_value,
            "Document received"
        );
        Ok(id)
    }

    async fn flush(&self) -> Result<(), ContractError> {
        // Nothing to flush for log sink
        Ok(())
    }
}
