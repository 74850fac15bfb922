//! Model and embedding backends.
//!
//! Implementations of [`LanguageModel`](crate::traits::model::LanguageModel)
//! and [`Embedder`](crate::traits::index::Embedder) for real providers.

#[cfg(feature = "openai")]
mod openai;

#[cfg(feature = "openai")]
pub use ai_client::AiClient;
