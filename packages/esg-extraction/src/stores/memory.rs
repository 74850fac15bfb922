//! In-memory result store for testing and development.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::Result;
use crate::traits::store::{RecordFilter, ResultStore, StoredRecord};
use crate::types::result::ExtractionResult;

/// Keeps records in a `Vec`. Data is lost when the store is dropped.
#[derive(Default)]
pub struct MemoryResultStore {
    records: RwLock<Vec<StoredRecord>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all stored records.
    pub fn clear(&self) {
        self.records.write().unwrap().clear();
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn save(&self, company: &str, year: i32, results: &[ExtractionResult]) -> Result<usize> {
        let mut records = self.records.write().unwrap();
        let mut next_id = records.last().map_or(1, |r| r.id + 1);
        for result in results {
            let mut record = StoredRecord::from_result(company, year, result);
            record.id = next_id;
            next_id += 1;
            records.push(record);
        }
        Ok(results.len())
    }

    async fn records(&self, filter: &RecordFilter) -> Result<Vec<StoredRecord>> {
        Ok(self
            .records
            .read()
            .unwrap()
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }
}
