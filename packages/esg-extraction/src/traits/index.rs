//! Semantic index and embedding traits.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::IndexResult;

/// A chunk returned by a semantic query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexHit {
    pub text: String,
    pub page: usize,
    /// Cosine similarity to the query
    pub score: f32,
}

/// Chunk-level semantic search over one document.
#[async_trait]
pub trait SemanticIndex: Send + Sync {
    /// Chunk and embed `pages`, or load them from cache.
    ///
    /// The cache is keyed by a fingerprint of `doc_id`. Without `force`, an
    /// existing cache entry is loaded instead of rebuilding. Returns the
    /// number of indexed chunks.
    async fn build(
        &self,
        doc_id: &str,
        pages: &[(usize, String)],
        chunk_size: usize,
        overlap: usize,
        force: bool,
    ) -> IndexResult<usize>;

    /// Top `k` chunks by similarity to `text`, best first.
    async fn query(&self, text: &str, k: usize) -> IndexResult<Vec<IndexHit>>;

    /// Number of chunks currently indexed.
    fn chunk_count(&self) -> usize;
}

/// Turns text into vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, one vector per text, in input order.
    async fn embed_batch(&self, texts: &[&str]) -> IndexResult<Vec<Vec<f32>>>;

    /// Vector width, when known without calling the backend.
    fn dimensions(&self) -> Option<usize> {
        None
    }

    /// Embed one text.
    async fn embed(&self, text: &str) -> IndexResult<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text]).await?;
        vectors
            .pop()
            .ok_or_else(|| crate::error::IndexError::EmbeddingCount {
                expected: 1,
                got: 0,
            })
    }
}

#[async_trait]
impl<T: Embedder + ?Sized> Embedder for Arc<T> {
    async fn embed_batch(&self, texts: &[&str]) -> IndexResult<Vec<Vec<f32>>> {
        (**self).embed_batch(texts).await
    }

    fn dimensions(&self) -> Option<usize> {
        (**self).dimensions()
    }
}

/// Calculate cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 0.001);
        assert!(cosine_similarity(&a, &[0.0, 1.0, 0.0]).abs() < 0.001);
        assert!((cosine_similarity(&a, &[-1.0, 0.0, 0.0]) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_degenerate() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }
}
