//! OpenAI-compatible backend via `ai-client`.
//!
//! # Example
//!
//! ```rust,ignore
//! use esg_extraction::ai::AiClient;
//! use esg_extraction::gateway::ModelGateway;
//!
//! let client = AiClient::from_env()?;
//! let gateway = ModelGateway::new(client, ModelSettings::from_env()?);
//! ```

use ai_client::{AiClient, AiClientError, ChatRequest, Message};
use async_trait::async_trait;
use tracing::debug;

use crate::error::{IndexError, IndexResult, ModelError, ModelResult};
use crate::traits::index::Embedder;
use crate::traits::model::{LanguageModel, ModelRequest};

impl From<AiClientError> for ModelError {
    fn from(err: AiClientError) -> Self {
        match err {
            AiClientError::Config(msg) => ModelError::Config(msg),
            AiClientError::Network(msg) => ModelError::Transport(msg),
            AiClientError::Api(msg) => ModelError::Api(msg),
            AiClientError::EmptyResponse { model } => ModelError::EmptyResponse { model },
            AiClientError::Parse(msg) => ModelError::Malformed(msg),
        }
    }
}

fn chat_request(request: &ModelRequest) -> ChatRequest {
    let mut chat = ChatRequest::new(&request.model);
    if let Some(system) = &request.system_prompt {
        chat = chat.message(Message::system(system));
    }
    chat.message(Message::user(&request.prompt))
        .temperature(request.temperature)
        .max_tokens(request.max_tokens)
        .json_mode(request.structured)
}

#[async_trait]
impl LanguageModel for AiClient {
    async fn complete(&self, request: &ModelRequest) -> ModelResult<String> {
        let response = self.chat_completion(chat_request(request)).await?;
        if let Some(usage) = &response.usage {
            debug!(
                model = %request.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Chat completion usage"
            );
        }
        Ok(response.content)
    }
}

#[async_trait]
impl Embedder for AiClient {
    async fn embed_batch(&self, texts: &[&str]) -> IndexResult<Vec<Vec<f32>>> {
        self.create_embeddings(texts)
            .await
            .map_err(|e| IndexError::Embedding(e.to_string()))
    }
}
