//! Fixed-pipeline strategy.
//!
//! One structured model call per candidate context, best answer wins, early
//! exit on a confident find.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::{ModelError, Result};
use crate::gateway::ModelGateway;
use crate::pipeline::answer::{parse_json_reply, ModelAnswer};
use crate::pipeline::context::ContextPreparer;
use crate::pipeline::prompts::{format_pipeline_prompt, PIPELINE_SYSTEM_PROMPT};
use crate::pipeline::runner::ExtractionStrategy;
use crate::traits::document::DocumentAccess;
use crate::traits::model::LanguageModel;
use crate::types::config::ExtractionConfig;
use crate::types::context::CandidateContext;
use crate::types::indicator::Indicator;
use crate::types::result::{ExtractionMethod, ExtractionResult};

/// Hard cap on attempts regardless of configuration.
pub const MAX_ATTEMPTS: usize = 3;

/// Explanation when the preparer found nothing to read.
pub const NO_CONTEXT_EXPLANATION: &str = "No relevant context found in document";

/// Keyword contexts plus a JSON-mode model call per context.
pub struct FixedPipelineStrategy<M: LanguageModel> {
    gateway: Arc<ModelGateway<M>>,
    preparer: ContextPreparer,
    config: ExtractionConfig,
}

impl<M: LanguageModel> FixedPipelineStrategy<M> {
    pub fn new(gateway: Arc<ModelGateway<M>>, config: ExtractionConfig) -> Self {
        Self {
            gateway,
            preparer: ContextPreparer::new(config.clone()),
            config,
        }
    }

    /// Try up to `min(max_attempts, 3, contexts.len())` contexts in order.
    ///
    /// Fails only when every attempt failed at the model gateway.
    pub async fn extract_from_contexts(
        &self,
        indicator: &Indicator,
        contexts: Vec<CandidateContext>,
        max_attempts: usize,
    ) -> std::result::Result<ExtractionResult, ModelError> {
        if contexts.is_empty() {
            warn!(indicator = %indicator.code, "No contexts found");
            return Ok(ExtractionResult::not_found(
                &indicator.code,
                ExtractionMethod::Simple,
                NO_CONTEXT_EXPLANATION,
            ));
        }

        let attempts = max_attempts.min(MAX_ATTEMPTS).min(contexts.len());
        let mut best: Option<(ModelAnswer, Option<usize>)> = None;
        let mut best_confidence = 0.0;
        let mut first_explanation: Option<String> = None;
        let mut last_error = None;
        let mut answered = 0;

        for (i, context) in contexts.into_iter().take(attempts).enumerate() {
            info!(indicator = %indicator.code, attempt = i + 1, attempts, "Extraction attempt");

            let request = self
                .gateway
                .request(format_pipeline_prompt(
                    indicator,
                    &context.text,
                    self.config.pipeline_context_chars,
                ))
                .with_system_prompt(PIPELINE_SYSTEM_PROMPT)
                .with_max_tokens(self.config.pipeline_max_tokens)
                .structured(true);

            let reply = match self.gateway.call_default(&request).await {
                Ok((reply, _model)) => reply,
                Err(e) => {
                    warn!(indicator = %indicator.code, attempt = i + 1, error = %e, "Attempt failed");
                    last_error = Some(e);
                    continue;
                }
            };
            answered += 1;

            let answer = match parse_json_reply(&reply) {
                Ok(value) => ModelAnswer::from_value(&value),
                Err(e) => {
                    warn!(indicator = %indicator.code, error = %e, "Malformed JSON answer");
                    continue;
                }
            };

            let confidence = answer.confidence_or_zero();
            debug!(indicator = %indicator.code, found = answer.found, confidence, "Parsed answer");

            if first_explanation.is_none() {
                first_explanation = answer.explanation.clone();
            }

            let confident = answer.found && confidence > self.config.early_exit_confidence;
            if confidence > best_confidence {
                best_confidence = confidence;
                best = Some((answer, context.page_number));
            }
            if confident {
                debug!(indicator = %indicator.code, "Confident answer, stopping early");
                break;
            }
        }

        if answered == 0 {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        let result = match best {
            Some((answer, page)) if answer.found && answer.value.is_some() => {
                let mut result =
                    answer.into_result(&indicator.code, ExtractionMethod::Simple, 0.0);
                if result.source_page.is_none() {
                    result.source_page = page;
                }
                result
            }
            best => {
                let explanation = best
                    .and_then(|(answer, _)| answer.explanation)
                    .or(first_explanation)
                    .unwrap_or_else(|| "Indicator not found in any context".to_string());
                ExtractionResult::not_found(&indicator.code, ExtractionMethod::Simple, explanation)
            }
        };
        Ok(result)
    }
}

#[async_trait]
impl<M: LanguageModel> ExtractionStrategy for FixedPipelineStrategy<M> {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::Simple
    }

    async fn extract(
        &self,
        indicator: &Indicator,
        document: &dyn DocumentAccess,
    ) -> Result<ExtractionResult> {
        let contexts = self.preparer.prepare(indicator, document)?;
        info!(indicator = %indicator.code, contexts = contexts.len(), "Prepared contexts");
        Ok(self
            .extract_from_contexts(indicator, contexts, self.config.max_pipeline_attempts)
            .await?)
    }
}
