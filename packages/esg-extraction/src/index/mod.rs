//! Semantic index implementations.
//!
//! - `EmbeddingIndex` - Cosine ranking over any `Embedder`, with a JSON cache
//! - `HashEmbedder` - Offline feature-hashing embedder

pub mod embedding;
pub mod hash;

pub use embedding::{fingerprint, window_pages, EmbeddingIndex};
pub use hash::HashEmbedder;
