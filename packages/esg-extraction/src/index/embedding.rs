//! Embedding-backed semantic index with an on-disk cache.
//!
//! Pages are cut into overlapping character windows, embedded in batches and
//! ranked by cosine similarity at query time. When a cache directory is set,
//! the embedded chunks are written to `{cache_dir}/{fingerprint}.json`, where
//! the fingerprint is the SHA-256 of the document id. A later `build` for the
//! same document loads that file instead of re-embedding, provided it was
//! written with the same chunking and embedding width.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{IndexError, IndexResult};
use crate::traits::index::{cosine_similarity, Embedder, IndexHit, SemanticIndex};

/// Texts sent to the embedder per call.
const EMBED_BATCH_SIZE: usize = 32;

/// Chunks at or below this many trimmed characters are dropped.
pub const DEFAULT_MIN_CHUNK_CHARS: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexedChunk {
    text: String,
    page: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheFile {
    doc_id: String,
    chunk_size: usize,
    overlap: usize,
    #[serde(default)]
    min_chunk_chars: usize,
    /// Embedding width, 0 for an empty index
    #[serde(default)]
    dimensions: usize,
    chunks: Vec<IndexedChunk>,
}

impl CacheFile {
    /// Why this cache cannot serve a build with the given settings, if it can't.
    fn mismatch(
        &self,
        chunk_size: usize,
        overlap: usize,
        min_chunk_chars: usize,
        dimensions: Option<usize>,
    ) -> Option<String> {
        if self.chunk_size != chunk_size || self.overlap != overlap {
            return Some(format!(
                "cached chunking {}/{}, requested {}/{}",
                self.chunk_size, self.overlap, chunk_size, overlap
            ));
        }
        if self.min_chunk_chars != min_chunk_chars {
            return Some(format!(
                "cached min chunk chars {}, requested {}",
                self.min_chunk_chars, min_chunk_chars
            ));
        }
        match dimensions {
            Some(d) if !self.chunks.is_empty() && self.dimensions != d => Some(format!(
                "cached embedding width {}, embedder width {}",
                self.dimensions, d
            )),
            _ => None,
        }
    }
}

/// SHA-256 hex digest of a document id, used as its cache file name.
pub fn fingerprint(doc_id: &str) -> String {
    format!("{:x}", Sha256::digest(doc_id.as_bytes()))
}

/// Cut every page into `size`-character windows starting every
/// `size - overlap` characters, keeping windows whose trimmed length exceeds
/// `min_chars`.
///
/// Windows start at every step up to the page end, so the last few windows
/// of a page are progressively shorter tails.
pub fn window_pages(
    pages: &[(usize, String)],
    size: usize,
    overlap: usize,
    min_chars: usize,
) -> Vec<(usize, String)> {
    let size = size.max(1);
    let step = size.saturating_sub(overlap).max(1);

    let mut windows = Vec::new();
    for (page, text) in pages {
        let chars: Vec<char> = text.chars().collect();
        for start in (0..chars.len()).step_by(step) {
            let end = (start + size).min(chars.len());
            let chunk: String = chars[start..end].iter().collect();
            let trimmed = chunk.trim();
            if trimmed.chars().count() > min_chars {
                windows.push((*page, trimmed.to_string()));
            }
        }
    }
    windows
}

/// A [`SemanticIndex`] over any [`Embedder`].
pub struct EmbeddingIndex<E> {
    embedder: E,
    cache_dir: Option<PathBuf>,
    min_chunk_chars: usize,
    chunks: RwLock<Option<Vec<IndexedChunk>>>,
}

impl<E: Embedder> EmbeddingIndex<E> {
    /// Create an index without a cache.
    pub fn new(embedder: E) -> Self {
        Self {
            embedder,
            cache_dir: None,
            min_chunk_chars: DEFAULT_MIN_CHUNK_CHARS,
            chunks: RwLock::new(None),
        }
    }

    /// Persist embeddings under `dir`.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn with_min_chunk_chars(mut self, min_chars: usize) -> Self {
        self.min_chunk_chars = min_chars;
        self
    }

    /// Cache file for a document, if caching is enabled.
    pub fn cache_path(&self, doc_id: &str) -> Option<PathBuf> {
        self.cache_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.json", fingerprint(doc_id))))
    }

    async fn load_cache(path: &Path) -> IndexResult<Option<CacheFile>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_cache(path: &Path, cache: &CacheFile) -> IndexResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        // Write then rename so a concurrent reader never sees a partial file.
        let tmp = path.with_extension(format!("json.{}.tmp", uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp, serde_json::to_vec(cache)?).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    async fn embed_windows(&self, windows: Vec<(usize, String)>) -> IndexResult<Vec<IndexedChunk>> {
        let mut chunks = Vec::with_capacity(windows.len());
        for batch in windows.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<&str> = batch.iter().map(|(_, t)| t.as_str()).collect();
            let vectors = self.embedder.embed_batch(&texts).await?;
            if vectors.len() != texts.len() {
                return Err(IndexError::EmbeddingCount {
                    expected: texts.len(),
                    got: vectors.len(),
                });
            }
            for ((page, text), embedding) in batch.iter().zip(vectors) {
                chunks.push(IndexedChunk {
                    text: text.clone(),
                    page: *page,
                    embedding,
                });
            }
        }
        Ok(chunks)
    }
}

#[async_trait]
impl<E: Embedder> SemanticIndex for EmbeddingIndex<E> {
    async fn build(
        &self,
        doc_id: &str,
        pages: &[(usize, String)],
        chunk_size: usize,
        overlap: usize,
        force: bool,
    ) -> IndexResult<usize> {
        let cache_path = self.cache_path(doc_id);

        if let (Some(path), false) = (&cache_path, force) {
            match Self::load_cache(path).await {
                Ok(Some(cache)) => match cache.mismatch(
                    chunk_size,
                    overlap,
                    self.min_chunk_chars,
                    self.embedder.dimensions(),
                ) {
                    Some(reason) => warn!(doc_id, %reason, "Stale index cache, rebuilding"),
                    None => {
                        let count = cache.chunks.len();
                        info!(doc_id, chunks = count, "Loaded index from cache");
                        *self.chunks.write().unwrap() = Some(cache.chunks);
                        return Ok(count);
                    }
                },
                Ok(None) => {}
                Err(e) => warn!(doc_id, error = %e, "Ignoring unreadable index cache"),
            }
        }

        let windows = window_pages(pages, chunk_size, overlap, self.min_chunk_chars);
        debug!(doc_id, windows = windows.len(), "Embedding chunks");
        let chunks = self.embed_windows(windows).await?;
        let count = chunks.len();

        if let Some(path) = &cache_path {
            let cache = CacheFile {
                doc_id: doc_id.to_string(),
                chunk_size,
                overlap,
                min_chunk_chars: self.min_chunk_chars,
                dimensions: chunks.first().map(|c| c.embedding.len()).unwrap_or(0),
                chunks: chunks.clone(),
            };
            Self::write_cache(path, &cache).await?;
        }

        info!(doc_id, chunks = count, "Built index");
        *self.chunks.write().unwrap() = Some(chunks);
        Ok(count)
    }

    async fn query(&self, text: &str, k: usize) -> IndexResult<Vec<IndexHit>> {
        if self.chunks.read().unwrap().is_none() {
            return Err(IndexError::NotBuilt);
        }

        let query = self.embedder.embed(text).await?;

        let guard = self.chunks.read().unwrap();
        let chunks = guard.as_ref().ok_or(IndexError::NotBuilt)?;
        if let Some(first) = chunks.first() {
            if first.embedding.len() != query.len() {
                return Err(IndexError::DimensionMismatch {
                    index: first.embedding.len(),
                    query: query.len(),
                });
            }
        }
        let mut hits: Vec<IndexHit> = chunks
            .iter()
            .map(|chunk| IndexHit {
                text: chunk.text.clone(),
                page: chunk.page,
                score: cosine_similarity(&query, &chunk.embedding),
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);
        Ok(hits)
    }

    fn chunk_count(&self) -> usize {
        self.chunks
            .read()
            .unwrap()
            .as_ref()
            .map(Vec::len)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::HashEmbedder;

    fn pages() -> Vec<(usize, String)> {
        vec![
            (
                1,
                "Our total scope 1 greenhouse gas emissions were 1,234 tCO2e in 2024, \
                 down from 1,400 tCO2e the year before."
                    .to_string(),
            ),
            (
                2,
                "The board of directors has eleven members, four of whom are women, \
                 and met eleven times during the reporting year."
                    .to_string(),
            ),
            (3, "Short".to_string()),
        ]
    }

    #[test]
    fn test_window_pages_drops_short_chunks() {
        let windows = window_pages(&pages(), 600, 100, 50);
        assert_eq!(windows.len(), 2);
        assert!(windows.iter().all(|(p, _)| *p != 3));
    }

    #[test]
    fn test_window_pages_includes_tails() {
        let text = "x".repeat(1200);
        let windows = window_pages(&[(1, text)], 600, 100, 50);
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[1].1.len(), 600);
        assert_eq!(windows[2].1.len(), 200);
    }

    #[test]
    fn test_fingerprint_is_stable_hex() {
        let a = fingerprint("reports/acme_2024.pdf");
        assert_eq!(a, fingerprint("reports/acme_2024.pdf"));
        assert_eq!(a.len(), 64);
        assert_ne!(a, fingerprint("reports/acme_2023.pdf"));
    }

    #[tokio::test]
    async fn test_query_before_build() {
        let index = EmbeddingIndex::new(HashEmbedder::default());
        assert!(matches!(index.query("x", 3).await, Err(IndexError::NotBuilt)));
        assert_eq!(index.chunk_count(), 0);
    }

    #[tokio::test]
    async fn test_query_ranks_relevant_page_first() {
        let index = EmbeddingIndex::new(HashEmbedder::default());
        let count = index.build("doc", &pages(), 600, 100, false).await.unwrap();
        assert_eq!(count, 2);

        let hits = index.query("scope 1 greenhouse gas emissions", 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].page, 1);
    }

    #[tokio::test]
    async fn test_cache_reused_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let index = EmbeddingIndex::new(HashEmbedder::default()).with_cache_dir(dir.path());
        index.build("doc", &pages(), 600, 100, false).await.unwrap();
        assert!(index.cache_path("doc").unwrap().exists());

        // Different pages, same id: the cache wins unless forced.
        let fresh = EmbeddingIndex::new(HashEmbedder::default()).with_cache_dir(dir.path());
        let count = fresh.build("doc", &[], 600, 100, false).await.unwrap();
        assert_eq!(count, 2);

        let forced = fresh.build("doc", &[], 600, 100, true).await.unwrap();
        assert_eq!(forced, 0);
    }

    #[tokio::test]
    async fn test_cache_with_other_settings_is_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        let long_page = vec![(1, "emissions and energy use across all sites ".repeat(20))];
        let original = EmbeddingIndex::new(HashEmbedder::default()).with_cache_dir(dir.path());
        let built = original.build("doc", &long_page, 600, 100, false).await.unwrap();

        let rechunked = EmbeddingIndex::new(HashEmbedder::default()).with_cache_dir(dir.path());
        let count = rechunked.build("doc", &long_page, 200, 20, false).await.unwrap();
        assert_ne!(count, built);
        assert_eq!(count, window_pages(&long_page, 200, 20, DEFAULT_MIN_CHUNK_CHARS).len());
    }

    #[tokio::test]
    async fn test_cache_from_other_embedder_width_is_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        let original = EmbeddingIndex::new(HashEmbedder::default()).with_cache_dir(dir.path());
        original.build("doc", &pages(), 600, 100, false).await.unwrap();

        let narrow = EmbeddingIndex::new(HashEmbedder::new(64)).with_cache_dir(dir.path());
        narrow.build("doc", &pages(), 600, 100, false).await.unwrap();

        let hits = narrow.query("scope 1 greenhouse gas emissions", 2).await.unwrap();
        assert_eq!(hits[0].page, 1);
        assert!(hits[0].score > 0.0);
    }

    /// Embedder that does not report its width.
    struct UnsizedEmbedder(HashEmbedder);

    #[async_trait]
    impl Embedder for UnsizedEmbedder {
        async fn embed_batch(&self, texts: &[&str]) -> IndexResult<Vec<Vec<f32>>> {
            self.0.embed_batch(texts).await
        }
    }

    #[tokio::test]
    async fn test_query_width_mismatch_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let original = EmbeddingIndex::new(HashEmbedder::default()).with_cache_dir(dir.path());
        original.build("doc", &pages(), 600, 100, false).await.unwrap();

        let unsized_index =
            EmbeddingIndex::new(UnsizedEmbedder(HashEmbedder::new(64))).with_cache_dir(dir.path());
        unsized_index.build("doc", &pages(), 600, 100, false).await.unwrap();

        assert!(matches!(
            unsized_index.query("emissions", 1).await,
            Err(IndexError::DimensionMismatch { query: 64, .. })
        ));
    }
}
