//! Local feature-hashing embedder.
//!
//! Hashes lowercase word and bigram features into a fixed number of signed
//! buckets and L2-normalizes the result. No model download or network call;
//! similarity reflects shared vocabulary rather than meaning, which is enough
//! to rank report passages against indicator keywords.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::IndexResult;
use crate::traits::index::Embedder;

/// Default vector width.
pub const DEFAULT_DIMENSIONS: usize = 384;

/// Deterministic embedder based on feature hashing.
#[derive(Debug, Clone, Copy)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

impl HashEmbedder {
    /// Create an embedder producing vectors of `dimensions` (at least 8).
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(8),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Embed one text synchronously.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0_f32; self.dimensions];

        for feature in features(text) {
            let hash = stable_hash(&feature);
            let index = (hash % self.dimensions as u64) as usize;
            let sign = if (hash >> 63) & 1 == 0 { 1.0 } else { -1.0 };
            let weight = 1.0 + ((hash >> 48) & 0xFF) as f32 / 255.0;
            vector[index] += sign * weight;
        }

        normalize(&mut vector);
        vector
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> IndexResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.dimensions)
    }
}

fn features(text: &str) -> Vec<String> {
    let words: Vec<String> = text
        .split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|w| !w.is_empty())
        .collect();

    let mut features = Vec::with_capacity(words.len() * 2);
    for (i, word) in words.iter().enumerate() {
        features.push(format!("w:{word}"));
        if let Some(next) = words.get(i + 1) {
            features.push(format!("b:{word}_{next}"));
        }
    }
    features
}

// SHA-256 prefix rather than `DefaultHasher`: cached vectors must stay
// comparable across toolchain versions.
fn stable_hash(value: &str) -> u64 {
    let digest = Sha256::digest(value.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

fn normalize(values: &mut [f32]) {
    let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in values {
            *value /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::index::cosine_similarity;

    #[test]
    fn test_deterministic_and_normalized() {
        let embedder = HashEmbedder::new(64);
        let a = embedder.embed_text("Scope 1 GHG emissions");
        let b = embedder.embed_text("Scope 1 GHG emissions");
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let v = HashEmbedder::new(16).embed_text("  ,; ");
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_shared_vocabulary_ranks_higher() {
        let embedder = HashEmbedder::default();
        let query = embedder.embed_text("total scope 1 greenhouse gas emissions");
        let related = embedder.embed_text("Our scope 1 greenhouse gas emissions fell to 1,234 tCO2e");
        let unrelated = embedder.embed_text("The board met eleven times during the year");
        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[test]
    fn test_minimum_dimensions() {
        assert_eq!(HashEmbedder::new(2).dimensions(), 8);
    }
}
