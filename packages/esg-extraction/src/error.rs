//! Typed errors for the extraction engine.
//!
//! Uses `thiserror` for library errors (not `anyhow`). Each component has its
//! own error enum; [`ExtractionError`] is the umbrella the run orchestrator
//! records against an indicator.

use thiserror::Error;

/// Errors from the language model gateway and its backends.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Could not reach the provider
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success status or an error envelope in the body
    #[error("API error: {0}")]
    Api(String),

    /// The provider answered without usable text
    #[error("empty response from {model}")]
    EmptyResponse { model: String },

    /// Response body did not match the expected shape
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Backend is misconfigured (missing key, bad URL)
    #[error("model config error: {0}")]
    Config(String),

    /// Every model in the fallback list failed
    #[error("all {attempts} models failed, last error: {last}")]
    AllModelsFailed {
        attempts: usize,
        #[source]
        last: Box<ModelError>,
    },

    /// No models configured
    #[error("no models configured")]
    NoModels,
}

/// Errors from document access.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Document does not exist or cannot be opened
    #[error("document not found: {0}")]
    NotFound(String),

    /// Page index outside `1..=count`
    #[error("Page {page} out of range (1-{count})")]
    PageOutOfRange { page: usize, count: usize },

    /// Range with start after end or outside the document
    #[error("page range {start}-{end} out of bounds (1-{count})")]
    InvalidRange {
        start: usize,
        end: usize,
        count: usize,
    },

    /// Search pattern is not a valid regex
    #[error("invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Underlying reader failed
    #[error("document backend error: {0}")]
    Backend(String),
}

/// Errors from the semantic index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// `query` called before `build`
    #[error("no document indexed, call build first")]
    NotBuilt,

    /// Embedding backend failed
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Embedder returned a different number of vectors than texts
    #[error("expected {expected} embeddings, got {got}")]
    EmbeddingCount { expected: usize, got: usize },

    /// Query vector width differs from the indexed vectors
    #[error("query embedding has {query} dimensions, index has {index}")]
    DimensionMismatch { index: usize, query: usize },

    /// Cache file could not be read or written
    #[error("index cache io error: {0}")]
    CacheIo(#[from] std::io::Error),

    /// Cache file is not valid JSON
    #[error("index cache is corrupt: {0}")]
    CacheFormat(#[from] serde_json::Error),
}

/// Errors raised while dispatching an agent tool call.
///
/// These never escape the agent loop; they are rendered as an
/// `{"error": ...}` observation.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The model named a tool that does not exist
    #[error("Tool {0} not found")]
    UnknownTool(String),

    /// Arguments did not match the tool's schema
    #[error("invalid input for {tool}: {reason}")]
    InvalidInput { tool: String, reason: String },

    /// Tool ran and the document rejected the request
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Errors that can occur during an extraction run.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Document could not be opened or read
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// Model gateway failed
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Semantic index failed
    #[error("index error: {0}")]
    Index(#[from] IndexError),

    /// Result store failed
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Result type alias for model gateway operations.
pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Result type alias for document operations.
pub type DocumentResult<T> = std::result::Result<T, DocumentError>;

/// Result type alias for index operations.
pub type IndexResult<T> = std::result::Result<T, IndexError>;
