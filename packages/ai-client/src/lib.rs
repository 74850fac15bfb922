//! Provider-agnostic AI client
//!
//! A minimal client for OpenAI-compatible chat completion and embedding APIs.
//! Defaults to OpenRouter, which routes one request format to many model
//! vendors; point it at `https://api.openai.com/v1` for OpenAI directly.
//!
//! # Example
//!
//! ```rust,ignore
//! use ai_client::{AiClient, ChatRequest, Message};
//!
//! let client = AiClient::from_env()?;
//!
//! let response = client.chat_completion(
//!     ChatRequest::new("meta-llama/llama-3.3-70b-instruct:free")
//!         .message(Message::user("Hello!"))
//!         .json_mode(true),
//! ).await?;
//! ```

pub mod error;
pub mod types;

pub use error::{AiClientError, Result};
pub use types::*;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{debug, warn};

/// Default API endpoint.
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// OpenAI-compatible API client.
#[derive(Clone)]
pub struct AiClient {
    http_client: Client,
    api_key: Arc<SecretString>,
    base_url: String,
    app_name: Option<String>,
    embedding_model: String,
}

impl AiClient {
    /// Create a new client with the given API key, targeting OpenRouter.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: Arc::new(SecretString::from(api_key.into())),
            base_url: OPENROUTER_BASE_URL.to_string(),
            app_name: None,
            embedding_model: "text-embedding-3-small".to_string(),
        }
    }

    /// Create from environment.
    ///
    /// Reads `OPENROUTER_API_KEY` (falling back to `OPENAI_API_KEY`) and an
    /// optional `OPENROUTER_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .map_err(|_| {
                AiClientError::Config("OPENROUTER_API_KEY or OPENAI_API_KEY not set".into())
            })?;

        let client = Self::new(api_key);
        Ok(match std::env::var("OPENROUTER_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => client.with_base_url(url),
            _ => client,
        })
    }

    /// Set a custom base URL (OpenAI, Azure, proxies, local servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Send an `X-Title` attribution header (shown on OpenRouter dashboards).
    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    /// Set the embedding model used by [`AiClient::create_embeddings`].
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the embedding model name.
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .http_client
            .post(format!("{}/{}", self.base_url, path))
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header("Content-Type", "application/json");

        if let Some(ref name) = self.app_name {
            builder = builder.header("X-Title", name.as_str());
        }
        builder
    }

    /// Chat completion.
    ///
    /// Fails on transport errors, non-2xx statuses, an `error` envelope in a
    /// 2xx body, a response without choices, and `null` or blank content.
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        let start = std::time::Instant::now();

        let response = self
            .post("chat/completions")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, model = %request.model, "Chat request failed");
                AiClientError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, model = %request.model, "Chat API error");
            return Err(AiClientError::Api(format!("{}: {}", status, error_text)));
        }

        let raw: ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| AiClientError::Parse(e.to_string()))?;

        let ChatResponseRaw {
            choices,
            usage,
            model,
            error,
        } = raw;

        if let Some(error) = error {
            let description = error.describe();
            warn!(model = %request.model, error = %description, "Error envelope in chat response");
            return Err(AiClientError::Api(description));
        }

        let content = choices
            .into_iter()
            .next()
            .ok_or_else(|| AiClientError::Api("API returned empty choices".into()))?
            .message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AiClientError::EmptyResponse {
                model: request.model.clone(),
            })?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis(),
            response_len = content.len(),
            "Chat completion"
        );

        Ok(ChatResponse {
            content,
            model,
            usage,
        })
    }

    /// Create embeddings for a batch of texts, in input order.
    pub async fn create_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: texts,
        };

        let response = self
            .post("embeddings")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Embedding request failed");
                AiClientError::Network(e.to_string())
            })?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(error = %error_text, "Embedding API error");
            return Err(AiClientError::Api(format!("embedding error: {}", error_text)));
        }

        let mut embed_response: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AiClientError::Parse(e.to_string()))?;

        if embed_response.data.len() != texts.len() {
            return Err(AiClientError::Parse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                embed_response.data.len()
            )));
        }

        embed_response.data.sort_by_key(|d| d.index);
        Ok(embed_response.data.into_iter().map(|d| d.embedding).collect())
    }
}

impl std::fmt::Debug for AiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiClient")
            .field("base_url", &self.base_url)
            .field("app_name", &self.app_name)
            .field("embedding_model", &self.embedding_model)
            .finish_non_exhaustive()
    }
}
