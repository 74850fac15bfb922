//! Error types for the AI client.

use thiserror::Error;

/// Result type for AI client operations.
pub type Result<T> = std::result::Result<T, AiClientError>;

/// AI client errors.
#[derive(Debug, Error)]
pub enum AiClientError {
    /// Configuration error (missing API key, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error (connection failed, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// API error (non-2xx response, rate limit, error envelope in body)
    #[error("API error: {0}")]
    Api(String),

    /// The provider answered but the completion carried no text
    #[error("Empty response from model {model}")]
    EmptyResponse { model: String },

    /// Parse error (invalid JSON, unexpected response format)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl AiClientError {
    /// Whether retrying the same request against another model may help.
    ///
    /// Configuration errors are never transient.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}
