//! Result persistence.
//!
//! The engine only writes; reading back is for reporting and exports.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::result::ExtractionResult;

/// One persisted indicator value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: i64,
    pub company: String,
    pub year: i32,
    pub indicator: String,
    pub value: Option<String>,
    pub numeric_value: Option<f64>,
    pub unit: Option<String>,
    pub source_page: Option<i64>,
    pub confidence: f64,
    /// Extraction explanation
    pub notes: Option<String>,
    pub source_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StoredRecord {
    /// Build a record from a result. `id` is assigned by the store.
    pub fn from_result(company: &str, year: i32, result: &ExtractionResult) -> Self {
        Self {
            id: 0,
            company: company.to_string(),
            year,
            indicator: result.indicator_code.clone(),
            value: result.value.clone(),
            numeric_value: result.numeric_value,
            unit: result.unit.clone(),
            source_page: result.source_page.map(|p| p as i64),
            confidence: result.confidence(),
            notes: result.explanation.clone(),
            source_text: result.source_text.clone(),
            created_at: Utc::now(),
        }
    }
}

/// Filter for reading records back. Empty matches everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordFilter {
    pub company: Option<String>,
    pub year: Option<i32>,
    pub indicator: Option<String>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    pub fn for_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn for_indicator(mut self, code: impl Into<String>) -> Self {
        self.indicator = Some(code.into());
        self
    }

    /// Check if a record passes this filter.
    pub fn matches(&self, record: &StoredRecord) -> bool {
        self.company.as_ref().map_or(true, |c| *c == record.company)
            && self.year.map_or(true, |y| y == record.year)
            && self.indicator.as_ref().map_or(true, |i| *i == record.indicator)
    }
}

/// Storage for extraction results.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Persist results for a company and year. Returns the number saved.
    async fn save(&self, company: &str, year: i32, results: &[ExtractionResult]) -> Result<usize>;

    /// Read records matching a filter, oldest first.
    async fn records(&self, filter: &RecordFilter) -> Result<Vec<StoredRecord>>;
}
