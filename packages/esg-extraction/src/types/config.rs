//! Configuration types for the extraction engine.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ExtractionError, Result};

/// Default primary model (OpenRouter free tier).
pub const DEFAULT_MODEL: &str = "meta-llama/llama-3.3-70b-instruct:free";

/// Default backup models, tried in order after the primary.
pub const DEFAULT_BACKUP_MODELS: &[&str] =
    &["google/gemini-2.0-flash-exp:free", "qwen/qwen3-coder:free"];

/// Model selection and sampling settings for the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    /// First model tried by `call_with_fallback`.
    pub default_model: String,

    /// Models tried after the default, in order.
    #[serde(default)]
    pub backup_models: Vec<String>,

    /// Sampling temperature. Default: 0.1.
    pub temperature: f32,

    /// Completion token cap when a strategy does not set one. Default: 2000.
    pub max_tokens: u32,

    /// Pause before every fallback attempt except the first.
    ///
    /// Default: 2000 ms. Tests use 0.
    pub fallback_backoff_ms: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            default_model: DEFAULT_MODEL.to_string(),
            backup_models: DEFAULT_BACKUP_MODELS.iter().map(|m| m.to_string()).collect(),
            temperature: 0.1,
            max_tokens: 2000,
            fallback_backoff_ms: 2000,
        }
    }
}

impl ModelSettings {
    /// Create settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from the environment.
    ///
    /// Reads a `.env` file if present, then `DEFAULT_MODEL`, `BACKUP_MODELS`
    /// (comma-separated), `TEMPERATURE` and `MAX_TOKENS`. Unset variables keep
    /// their defaults.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let mut settings = Self::default();

        if let Ok(model) = std::env::var("DEFAULT_MODEL") {
            if !model.trim().is_empty() {
                settings.default_model = model.trim().to_string();
            }
        }

        if let Ok(backups) = std::env::var("BACKUP_MODELS") {
            settings.backup_models = backups
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(String::from)
                .collect();
        }

        if let Ok(temperature) = std::env::var("TEMPERATURE") {
            settings.temperature = temperature.trim().parse().map_err(|_| {
                ExtractionError::Config(format!("TEMPERATURE is not a number: {temperature}"))
            })?;
        }

        if let Ok(max_tokens) = std::env::var("MAX_TOKENS") {
            settings.max_tokens = max_tokens.trim().parse().map_err(|_| {
                ExtractionError::Config(format!("MAX_TOKENS is not an integer: {max_tokens}"))
            })?;
        }

        Ok(settings)
    }

    /// Set the default model.
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Replace the backup models.
    pub fn with_backup_models(
        mut self,
        models: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.backup_models = models.into_iter().map(|m| m.into()).collect();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the default completion token cap.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the pause between fallback attempts.
    pub fn with_fallback_backoff(mut self, backoff: Duration) -> Self {
        self.fallback_backoff_ms = backoff.as_millis() as u64;
        self
    }

    /// Pause between fallback attempts.
    pub fn fallback_backoff(&self) -> Duration {
        Duration::from_millis(self.fallback_backoff_ms)
    }

    /// Full fallback list: default model followed by the backups.
    ///
    /// Blank entries are skipped.
    pub fn models(&self) -> Vec<String> {
        std::iter::once(&self.default_model)
            .chain(self.backup_models.iter())
            .filter(|m| !m.trim().is_empty())
            .cloned()
            .collect()
    }
}

/// Tunables for context preparation, strategies and scoring.
///
/// Thresholds are independent: a result can count as found
/// for quality scoring (> 0.3) without being validated in the report (> 0.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Pages added on each side of a keyword match. Default: 1.
    pub context_pages: usize,

    /// Keyword-matched pages handed to a strategy. Default: 3.
    pub max_keyword_contexts: usize,

    /// Chunk size for the no-match fallback, in characters. Default: 3000.
    pub fallback_chunk_size: usize,

    /// Chunk overlap for the no-match fallback. Default: 300.
    pub fallback_chunk_overlap: usize,

    /// Chunks handed to a strategy when no keyword matched. Default: 5.
    pub max_fallback_chunks: usize,

    /// Upper bound on fixed-pipeline attempts. Default: 3.
    pub max_pipeline_attempts: usize,

    /// Context characters sent per fixed-pipeline attempt. Default: 4000.
    pub pipeline_context_chars: usize,

    /// Completion token cap for fixed-pipeline calls. Default: 1000.
    pub pipeline_max_tokens: u32,

    /// Fixed-pipeline stops once a found answer exceeds this. Default: 0.8.
    pub early_exit_confidence: f64,

    /// Agent loop iteration cap. Default: 8.
    pub max_agent_iterations: usize,

    /// Confidence for a found agent answer that omits one. Default: 0.5.
    pub agent_default_confidence: f64,

    /// Semantic index chunk size, in characters. Default: 600.
    pub vector_chunk_size: usize,

    /// Semantic index chunk overlap. Default: 100.
    pub vector_chunk_overlap: usize,

    /// Chunks whose trimmed length is at most this are not indexed. Default: 50.
    pub vector_min_chunk_chars: usize,

    /// Chunks retrieved per indicator. Default: 3.
    pub vector_top_k: usize,

    /// Completion token cap for fast-vector calls. Default: 500.
    pub vector_max_tokens: u32,

    /// Rebuild the semantic index even when a cache file exists.
    pub force_reindex: bool,

    /// Directory holding semantic index cache files.
    pub index_cache_dir: PathBuf,

    /// A result counts as found for quality scoring above this. Default: 0.3.
    pub quality_found_threshold: f64,

    /// A result is marked validated in reports above this. Default: 0.5.
    pub validated_threshold: f64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            context_pages: 1,
            max_keyword_contexts: 3,
            fallback_chunk_size: 3000,
            fallback_chunk_overlap: 300,
            max_fallback_chunks: 5,
            max_pipeline_attempts: 3,
            pipeline_context_chars: 4000,
            pipeline_max_tokens: 1000,
            early_exit_confidence: 0.8,
            max_agent_iterations: 8,
            agent_default_confidence: 0.5,
            vector_chunk_size: 600,
            vector_chunk_overlap: 100,
            vector_min_chunk_chars: 50,
            vector_top_k: 3,
            vector_max_tokens: 500,
            force_reindex: false,
            index_cache_dir: PathBuf::from("data/embeddings_cache"),
            quality_found_threshold: 0.3,
            validated_threshold: 0.5,
        }
    }
}

impl ExtractionConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the keyword context window.
    pub fn with_context_pages(mut self, pages: usize) -> Self {
        self.context_pages = pages;
        self
    }

    /// Set the fixed-pipeline attempt cap.
    pub fn with_max_pipeline_attempts(mut self, attempts: usize) -> Self {
        self.max_pipeline_attempts = attempts;
        self
    }

    /// Set the agent iteration cap.
    pub fn with_max_agent_iterations(mut self, iterations: usize) -> Self {
        self.max_agent_iterations = iterations;
        self
    }

    /// Set the number of chunks retrieved per indicator.
    pub fn with_vector_top_k(mut self, k: usize) -> Self {
        self.vector_top_k = k;
        self
    }

    /// Set the minimum indexed chunk length.
    pub fn with_vector_min_chunk_chars(mut self, min_chars: usize) -> Self {
        self.vector_min_chunk_chars = min_chars;
        self
    }

    /// Set the semantic index cache directory.
    pub fn with_index_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.index_cache_dir = dir.into();
        self
    }

    /// Force the semantic index to rebuild.
    pub fn with_force_reindex(mut self, force: bool) -> Self {
        self.force_reindex = force;
        self
    }

    /// Set the quality found threshold.
    pub fn with_quality_found_threshold(mut self, threshold: f64) -> Self {
        self.quality_found_threshold = threshold;
        self
    }
}
