//! Language model gateway.
//!
//! Wraps a [`LanguageModel`] backend with the configured sampling defaults
//! and an ordered model fallback list. The gateway holds no mutable state,
//! so one instance can serve concurrent runs.

use tracing::{debug, info, warn};

use crate::error::{ModelError, ModelResult};
use crate::traits::model::{LanguageModel, ModelRequest};
use crate::types::config::ModelSettings;

/// Single-model and multi-model completion over one backend.
pub struct ModelGateway<M: LanguageModel> {
    backend: M,
    settings: ModelSettings,
}

impl<M: LanguageModel> ModelGateway<M> {
    pub fn new(backend: M, settings: ModelSettings) -> Self {
        Self { backend, settings }
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    pub fn backend(&self) -> &M {
        &self.backend
    }

    /// Start a request with the configured temperature, token cap and default model.
    pub fn request(&self, prompt: impl Into<String>) -> ModelRequest {
        ModelRequest::new(prompt)
            .with_model(self.settings.default_model.clone())
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens)
    }

    /// Complete a request against `request.model`.
    ///
    /// Empty or whitespace-only completions are reported as
    /// [`ModelError::EmptyResponse`] even if the backend let them through.
    pub async fn call(&self, request: &ModelRequest) -> ModelResult<String> {
        let text = self.backend.complete(request).await?;
        if text.trim().is_empty() {
            return Err(ModelError::EmptyResponse {
                model: request.model.clone(),
            });
        }
        debug!(model = %request.model, response_len = text.len(), "Model call succeeded");
        Ok(text)
    }

    /// Try `models` in order until one succeeds.
    ///
    /// Waits the configured backoff before every attempt except the first.
    /// An empty `models` slice falls back to the configured list. Returns the
    /// completion and the id of the model that produced it.
    pub async fn call_with_fallback(
        &self,
        request: &ModelRequest,
        models: &[String],
    ) -> ModelResult<(String, String)> {
        let configured;
        let models = if models.is_empty() {
            configured = self.settings.models();
            configured.as_slice()
        } else {
            models
        };

        if models.is_empty() {
            return Err(ModelError::NoModels);
        }

        let backoff = self.settings.fallback_backoff();
        let mut last_error = None;

        for (i, model) in models.iter().enumerate() {
            if i > 0 && !backoff.is_zero() {
                tokio::time::sleep(backoff).await;
            }

            info!(attempt = i + 1, total = models.len(), model = %model, "Trying model");
            let attempt = request.clone().with_model(model.clone());

            match self.call(&attempt).await {
                Ok(text) => {
                    info!(model = %model, "Model succeeded");
                    return Ok((text, model.clone()));
                }
                Err(e) => {
                    warn!(model = %model, error = %e, "Model failed");
                    last_error = Some(e);
                }
            }
        }

        Err(ModelError::AllModelsFailed {
            attempts: models.len(),
            last: Box::new(last_error.unwrap_or(ModelError::NoModels)),
        })
    }

    /// [`call_with_fallback`](Self::call_with_fallback) over the configured models.
    pub async fn call_default(&self, request: &ModelRequest) -> ModelResult<(String, String)> {
        self.call_with_fallback(request, &[]).await
    }
}
