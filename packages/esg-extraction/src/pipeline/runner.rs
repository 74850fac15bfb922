//! Run orchestration.
//!
//! [`Extractor`] opens a document, lets the strategy prepare (the vector
//! strategy indexes here), then extracts indicators one at a time in request
//! order. A failing indicator is recorded and replaced by a degraded result;
//! only a document that cannot be opened or prepared fails the run.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::traits::document::{DocumentAccess, DocumentSource};
use crate::types::config::ExtractionConfig;
use crate::types::indicator::Indicator;
use crate::types::result::{ExtractionMethod, ExtractionResult};
use crate::types::run::{ExtractionRun, RunReport, RunStatus};

/// One way of turning a document and an indicator into a result.
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    /// Method recorded on results.
    fn method(&self) -> ExtractionMethod;

    /// Per-document setup, run once before any indicator.
    async fn prepare(&self, _document: &dyn DocumentAccess) -> Result<()> {
        Ok(())
    }

    /// Extract one indicator.
    ///
    /// Not finding a value is an `Ok` zero-confidence result; `Err` is for
    /// failures such as every model being unreachable.
    async fn extract(
        &self,
        indicator: &Indicator,
        document: &dyn DocumentAccess,
    ) -> Result<ExtractionResult>;
}

#[async_trait]
impl<T: ExtractionStrategy + ?Sized> ExtractionStrategy for Arc<T> {
    fn method(&self) -> ExtractionMethod {
        (**self).method()
    }

    async fn prepare(&self, document: &dyn DocumentAccess) -> Result<()> {
        (**self).prepare(document).await
    }

    async fn extract(
        &self,
        indicator: &Indicator,
        document: &dyn DocumentAccess,
    ) -> Result<ExtractionResult> {
        (**self).extract(indicator, document).await
    }
}

/// Drives one strategy over a set of indicators.
pub struct Extractor<S, D> {
    source: D,
    strategy: S,
    config: ExtractionConfig,
}

impl<S: ExtractionStrategy, D: DocumentSource> Extractor<S, D> {
    pub fn new(source: D, strategy: S, config: ExtractionConfig) -> Self {
        Self {
            source,
            strategy,
            config,
        }
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract `indicators` from the document at `document_ref`.
    ///
    /// The report always holds one result per indicator, in order.
    pub async fn run(&self, document_ref: &str, indicators: &[Indicator]) -> RunReport {
        let method = self.strategy.method();
        let mut run = ExtractionRun::new(method);
        info!(
            run_id = %run.run_id(),
            document = %document_ref,
            method = %method,
            indicators = indicators.len(),
            "Starting extraction run"
        );

        let document = match self.source.open(document_ref).await {
            Ok(document) => document,
            Err(e) => {
                error!(document = %document_ref, error = %e, "Failed to open document");
                return self.abort(run, format!("Document open error: {}", e), indicators);
            }
        };

        if let Err(e) = self.strategy.prepare(document.as_ref()).await {
            error!(document = %document_ref, error = %e, "Failed to prepare document");
            return self.abort(run, format!("Preparation error: {}", e), indicators);
        }

        for (i, indicator) in indicators.iter().enumerate() {
            info!(
                indicator = %indicator.code,
                position = i + 1,
                total = indicators.len(),
                "Extracting indicator"
            );

            match self.strategy.extract(indicator, document.as_ref()).await {
                Ok(result) => {
                    info!(
                        indicator = %indicator.code,
                        found = result.is_found(),
                        confidence = result.confidence(),
                        "Extracted indicator"
                    );
                    run.push_result(result);
                }
                Err(e) => {
                    let message = format!("{} error for {}: {}", method, indicator.code, e);
                    warn!(indicator = %indicator.code, error = %e, "Extraction failed");
                    run.push_result(ExtractionResult::not_found(
                        &indicator.code,
                        method,
                        message.clone(),
                    ));
                    run.push_error(message);
                }
            }
        }

        drop(document);
        let report = run.finish(RunStatus::Success, self.config.quality_found_threshold);
        info!(
            run_id = %report.run_id,
            found = report.quality.found,
            total = report.quality.total,
            quality_score = report.quality.quality_score,
            elapsed_ms = report.elapsed_ms,
            "Extraction run complete"
        );
        report
    }

    fn abort(&self, mut run: ExtractionRun, message: String, indicators: &[Indicator]) -> RunReport {
        let method = run.method();
        for indicator in indicators {
            run.push_result(ExtractionResult::not_found(
                &indicator.code,
                method,
                message.clone(),
            ));
        }
        run.push_error(message);
        run.finish(RunStatus::Error, self.config.quality_found_threshold)
    }
}
