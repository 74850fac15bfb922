//! Per-run working state and the report it turns into.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pipeline::quality::{quality, QualityMetrics};
use crate::types::result::{ExtractionMethod, ExtractionResult};

/// Whether a run was able to proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    /// Document could not be opened or prepared
    Error,
}

/// Working state for one document and one indicator set.
///
/// Results and errors are append-only.
#[derive(Debug, Clone)]
pub struct ExtractionRun {
    run_id: Uuid,
    method: ExtractionMethod,
    started_at: DateTime<Utc>,
    results: Vec<ExtractionResult>,
    errors: Vec<String>,
}

impl ExtractionRun {
    pub fn new(method: ExtractionMethod) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            method,
            started_at: Utc::now(),
            results: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn method(&self) -> ExtractionMethod {
        self.method
    }

    pub fn results(&self) -> &[ExtractionResult] {
        &self.results
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn push_result(&mut self, result: ExtractionResult) {
        self.results.push(result);
    }

    pub fn push_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    /// Close the run and compute quality metrics.
    pub fn finish(self, status: RunStatus, found_threshold: f64) -> RunReport {
        let elapsed_ms = (Utc::now() - self.started_at).num_milliseconds().max(0) as u64;
        RunReport {
            run_id: self.run_id,
            status,
            method: self.method,
            quality: quality(&self.results, found_threshold),
            results: self.results,
            errors: self.errors,
            started_at: self.started_at,
            elapsed_ms,
        }
    }
}

/// Outcome of [`crate::pipeline::Extractor::run`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub method: ExtractionMethod,
    /// One result per requested indicator, in request order
    pub results: Vec<ExtractionResult>,
    pub errors: Vec<String>,
    pub quality: QualityMetrics,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl RunReport {
    /// Look up the result for an indicator code.
    pub fn result(&self, code: &str) -> Option<&ExtractionResult> {
        self.results.iter().find(|r| r.indicator_code == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_carries_results_and_quality() {
        let mut run = ExtractionRun::new(ExtractionMethod::Simple);
        run.push_result(
            ExtractionResult::new("E1-1", ExtractionMethod::Simple)
                .with_value("x")
                .with_confidence(0.9),
        );
        run.push_result(ExtractionResult::new("E1-2", ExtractionMethod::Simple));
        run.push_error("simple error for E1-3: boom");

        let id = run.run_id();
        let report = run.finish(RunStatus::Success, 0.3);

        assert_eq!(report.run_id, id);
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.quality.found, 1);
        assert!(report.result("E1-2").is_some());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_value(RunStatus::Error).unwrap(), "error");
    }
}
