//! Fixed-arity record schema
//!
//! A line becomes a `Record` only after its field count is checked.

use contracts::{FinancialData, Record, FIELD_COUNT};

use crate::error::{IngestionError, Result};

/// Build a `Record` from one decoded CSV row
///
/// Fields are taken verbatim (no trimming).
pub fn parse_record(line_number: u64, row: &csv::StringRecord) -> Result<Record> {
    if row.len() != FIELD_COUNT {
        return Err(IngestionError::field_count(line_number, row.len()));
    }

    let fields: [String; FIELD_COUNT] = std::array::from_fn(|i| row[i].to_string());
    Ok(Record::new(line_number, FinancialData::from_fields(fields)))
}
