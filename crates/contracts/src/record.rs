//! Record - Dispatcher output / Worker input
//!
//! One data line of the financial CSV source, mapped onto a fixed 14-field schema.

use serde::{Deserialize, Serialize};

/// Number of data fields in every source line
pub const FIELD_COUNT: usize = 14;

/// Column names in source order
pub const FIELD_NAMES: [&str; FIELD_COUNT] = [
    "series_reference",
    "period",
    "data_value",
    "suppressed",
    "status",
    "units",
    "magnitude",
    "subject",
    "group",
    "series_title_1",
    "series_title_2",
    "series_title_3",
    "series_title_4",
    "series_title_5",
];

/// Financial data document (the fields a sink persists)
///
/// Field order mirrors the source column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialData {
    pub series_reference: String,
    pub period: String,
    pub data_value: String,
    pub suppressed: String,
    pub status: String,
    pub units: String,
    pub magnitude: String,
    pub subject: String,
    pub group: String,
    pub series_title_1: String,
    pub series_title_2: String,
    pub series_title_3: String,
    pub series_title_4: String,
    pub series_title_5: String,
}

impl FinancialData {
    /// Build from exactly [`FIELD_COUNT`] values in source order
    pub fn from_fields(fields: [String; FIELD_COUNT]) -> Self {
        let [series_reference, period, data_value, suppressed, status, units, magnitude, subject, group, series_title_1, series_title_2, series_title_3, series_title_4, series_title_5] =
            fields;

        Self {
            series_reference,
            period,
            data_value,
            suppressed,
            status,
            units,
            magnitude,
            subject,
            group,
            series_title_1,
            series_title_2,
            series_title_3,
            series_title_4,
            series_title_5,
        }
    }

    /// Field values in source order
    pub fn fields(&self) -> [&str; FIELD_COUNT] {
        [
            &self.series_reference,
            &self.period,
            &self.data_value,
            &self.suppressed,
            &self.status,
            &self.units,
            &self.magnitude,
            &self.subject,
            &self.group,
            &self.series_title_1,
            &self.series_title_2,
            &self.series_title_3,
            &self.series_title_4,
            &self.series_title_5,
        ]
    }
}

/// A parsed source line
///
/// Immutable once built; the sink assigns its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// 1-based data line number (header excluded)
    pub line_number: u64,

    /// Field values
    pub data: FinancialData,
}

impl Record {
    pub fn new(line_number: u64, data: FinancialData) -> Self {
        Self { line_number, data }
    }
}

/// Partial update: only `Some` fields are written
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialPatch {
    pub series_reference: Option<String>,
    pub period: Option<String>,
    pub data_value: Option<String>,
    pub suppressed: Option<String>,
    pub status: Option<String>,
    pub units: Option<String>,
    pub magnitude: Option<String>,
    pub subject: Option<String>,
    pub group: Option<String>,
    pub series_title_1: Option<String>,
    pub series_title_2: Option<String>,
    pub series_title_3: Option<String>,
    pub series_title_4: Option<String>,
    pub series_title_5: Option<String>,
}

impl FinancialPatch {
    /// Apply the set fields onto `data`
    pub fn apply_to(&self, data: &mut FinancialData) {
        fn set(target: &mut String, value: &Option<String>) {
            if let Some(v) = value {
                target.clone_from(v);
            }
        }

        set(&mut data.series_reference, &self.series_reference);
        set(&mut data.period, &self.period);
        set(&mut data.data_value, &self.data_value);
        set(&mut data.suppressed, &self.suppressed);
        set(&mut data.status, &self.status);
        set(&mut data.units, &self.units);
        set(&mut data.magnitude, &self.magnitude);
        set(&mut data.subject, &self.subject);
        set(&mut data.group, &self.group);
        set(&mut data.series_title_1, &self.series_title_1);
        set(&mut data.series_title_2, &self.series_title_2);
        set(&mut data.series_title_3, &self.series_title_3);
        set(&mut data.series_title_4, &self.series_title_4);
        set(&mut data.series_title_5, &self.series_title_5);
    }

    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
