//! Language model backend trait.
//!
//! Implementations wrap a specific provider and turn one request into one
//! completion. Retries and model fallback live in
//! [`crate::gateway::ModelGateway`], not here.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ModelResult;

/// One completion request. Not retained beyond the call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRequest {
    /// User prompt
    pub prompt: String,

    /// Optional system prompt
    pub system_prompt: Option<String>,

    /// Model id (filled per attempt by the gateway)
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Completion token cap
    pub max_tokens: u32,

    /// Ask the provider for a single JSON object
    pub structured: bool,
}

impl ModelRequest {
    /// Create a request with temperature 0.1 and 2000 max tokens.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
            model: String::new(),
            temperature: 0.1,
            max_tokens: 2000,
            structured: false,
        }
    }

    pub fn with_system_prompt(mut self, system: impl Into<String>) -> Self {
        self.system_prompt = Some(system.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn structured(mut self, structured: bool) -> Self {
        self.structured = structured;
        self
    }
}

/// A chat-completion backend.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete a request.
    ///
    /// Must fail (not return an empty string) when the provider returns no
    /// choices, `null` content or whitespace-only text.
    async fn complete(&self, request: &ModelRequest) -> ModelResult<String>;
}

#[async_trait]
impl<T: LanguageModel + ?Sized> LanguageModel for Arc<T> {
    async fn complete(&self, request: &ModelRequest) -> ModelResult<String> {
        (**self).complete(request).await
    }
}
