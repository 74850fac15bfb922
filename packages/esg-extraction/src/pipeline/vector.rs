//! Fast vector strategy.
//!
//! Indexes the document once, then spends exactly one semantic query and one
//! model call per indicator. The model answers in labelled lines rather than
//! JSON.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::Result;
use crate::gateway::ModelGateway;
use crate::index::EmbeddingIndex;
use crate::numeric::find_numeric;
use crate::pipeline::prompts::{format_vector_prompt, vector_query};
use crate::pipeline::runner::ExtractionStrategy;
use crate::traits::document::DocumentAccess;
use crate::traits::index::{Embedder, IndexHit, SemanticIndex};
use crate::traits::model::LanguageModel;
use crate::types::config::ExtractionConfig;
use crate::types::indicator::Indicator;
use crate::types::result::{clamp_confidence, ExtractionMethod, ExtractionResult};

/// Confidence when the `CONFIDENCE:` label is present but unreadable.
pub const UNPARSEABLE_CONFIDENCE: f64 = 0.5;

const NOT_FOUND_SENTINELS: [&str; 3] = ["not found", "n/a", "none"];

/// Fields of a labelled `VALUE:/PAGE:/CONFIDENCE:/REASONING:` reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledReply {
    pub value: Option<String>,
    pub page: Option<usize>,
    pub confidence: f64,
    pub reasoning: Option<String>,
}

/// Parse a labelled reply line by line. Later labels overwrite earlier ones.
pub fn parse_labeled_reply(reply: &str) -> LabeledReply {
    let mut parsed = LabeledReply::default();

    for line in reply.trim().lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("VALUE:") {
            let value = rest.trim();
            parsed.value = (!is_sentinel(value) && !value.is_empty()).then(|| value.to_string());
        } else if let Some(rest) = line.strip_prefix("PAGE:") {
            let page = rest.trim();
            parsed.page = if is_sentinel(page) {
                None
            } else {
                page.parse().ok().filter(|p| *p >= 1)
            };
        } else if let Some(rest) = line.strip_prefix("CONFIDENCE:") {
            parsed.confidence = rest
                .trim()
                .parse::<f64>()
                .map(clamp_confidence)
                .unwrap_or(UNPARSEABLE_CONFIDENCE);
        } else if let Some(rest) = line.strip_prefix("REASONING:") {
            let reasoning = rest.trim();
            parsed.reasoning = (!reasoning.is_empty()).then(|| reasoning.to_string());
        }
    }
    parsed
}

fn is_sentinel(text: &str) -> bool {
    let lower = text.to_lowercase();
    NOT_FOUND_SENTINELS.contains(&lower.as_str())
}

/// Format hits as context, one `--- Page N (relevance: S) ---` header per page.
pub fn format_hits(hits: &[IndexHit]) -> String {
    let mut seen = HashSet::new();
    let mut parts = Vec::with_capacity(hits.len() * 2);
    for hit in hits {
        if seen.insert(hit.page) {
            parts.push(format!("\n--- Page {} (relevance: {:.2}) ---", hit.page, hit.score));
        }
        parts.push(hit.text.trim().to_string());
    }
    parts.join("\n\n")
}

/// Semantic retrieval plus a single model call per indicator.
///
/// The index holds the chunks of the last prepared document, so a strategy
/// instance serves one document at a time. Concurrent runs over different
/// documents each need their own instance rather than a shared `Arc`.
pub struct FastVectorStrategy<M: LanguageModel, I: SemanticIndex> {
    gateway: Arc<ModelGateway<M>>,
    index: I,
    config: ExtractionConfig,
}

impl<M: LanguageModel, I: SemanticIndex> FastVectorStrategy<M, I> {
    pub fn new(gateway: Arc<ModelGateway<M>>, index: I, config: ExtractionConfig) -> Self {
        Self {
            gateway,
            index,
            config,
        }
    }

    /// The semantic index.
    pub fn index(&self) -> &I {
        &self.index
    }

    /// Index the whole document. Returns the chunk count.
    pub async fn index_document(&self, document: &dyn DocumentAccess) -> Result<usize> {
        let pages = document.pages()?;
        info!(document = %document.id(), pages = pages.len(), "Indexing document");
        let chunks = self
            .index
            .build(
                document.id(),
                &pages,
                self.config.vector_chunk_size,
                self.config.vector_chunk_overlap,
                self.config.force_reindex,
            )
            .await?;
        Ok(chunks)
    }

    /// Extract one indicator from an indexed document.
    pub async fn extract_indicator(&self, indicator: &Indicator) -> Result<ExtractionResult> {
        let hits = self
            .index
            .query(&vector_query(indicator), self.config.vector_top_k)
            .await?;
        debug!(indicator = %indicator.code, hits = hits.len(), "Retrieved chunks");

        let request = self
            .gateway
            .request(format_vector_prompt(indicator, &format_hits(&hits)))
            .with_max_tokens(self.config.vector_max_tokens);
        let (reply, model) = self.gateway.call_default(&request).await?;

        let parsed = parse_labeled_reply(&reply);
        info!(
            indicator = %indicator.code,
            model = %model,
            found = parsed.value.is_some(),
            confidence = parsed.confidence,
            "Fast extraction"
        );

        let mut result = ExtractionResult::new(&indicator.code, ExtractionMethod::VectorSearch)
            .with_unit(&indicator.expected_unit)
            .with_confidence(parsed.confidence);
        result.numeric_value = parsed.value.as_deref().and_then(find_numeric);
        result.value = parsed.value;
        result.source_page = parsed.page;
        result.explanation = parsed.reasoning;
        Ok(result)
    }

    /// Index once, then extract every indicator in order.
    ///
    /// An indicator that fails becomes a zero-confidence result.
    pub async fn extract_batch(
        &self,
        indicators: &[Indicator],
        document: &dyn DocumentAccess,
    ) -> Result<Vec<ExtractionResult>> {
        self.index_document(document).await?;

        let mut results = Vec::with_capacity(indicators.len());
        for (i, indicator) in indicators.iter().enumerate() {
            info!(indicator = %indicator.code, position = i + 1, total = indicators.len(), "Extracting");
            let result = match self.extract_indicator(indicator).await {
                Ok(result) => result,
                Err(e) => ExtractionResult::not_found(
                    &indicator.code,
                    ExtractionMethod::VectorSearch,
                    format!("vector_search error for {}: {}", indicator.code, e),
                ),
            };
            results.push(result);
        }
        Ok(results)
    }
}

impl<M: LanguageModel, E: Embedder> FastVectorStrategy<M, EmbeddingIndex<E>> {
    /// Build an [`EmbeddingIndex`] from `config`: cached under
    /// `index_cache_dir`, dropping chunks of `vector_min_chunk_chars` or fewer.
    pub fn with_embedder(
        gateway: Arc<ModelGateway<M>>,
        embedder: E,
        config: ExtractionConfig,
    ) -> Self {
        let index = EmbeddingIndex::new(embedder)
            .with_cache_dir(&config.index_cache_dir)
            .with_min_chunk_chars(config.vector_min_chunk_chars);
        Self::new(gateway, index, config)
    }
}

#[async_trait]
impl<M: LanguageModel, I: SemanticIndex> ExtractionStrategy for FastVectorStrategy<M, I> {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::VectorSearch
    }

    async fn prepare(&self, document: &dyn DocumentAccess) -> Result<()> {
        self.index_document(document).await.map(|_| ())
    }

    async fn extract(
        &self,
        indicator: &Indicator,
        _document: &dyn DocumentAccess,
    ) -> Result<ExtractionResult> {
        self.extract_indicator(indicator).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::InMemoryDocument;
    use crate::index::{EmbeddingIndex, HashEmbedder};
    use crate::testing::MockModel;
    use crate::types::config::ModelSettings;
    use crate::types::indicator::Category;
    use std::time::Duration;

    #[test]
    fn test_parse_labeled_reply() {
        let parsed = parse_labeled_reply(
            "VALUE: 1,234 tCO2e\nPAGE: 77\nCONFIDENCE: 0.92\nREASONING: Emissions table",
        );
        assert_eq!(parsed.value.as_deref(), Some("1,234 tCO2e"));
        assert_eq!(parsed.page, Some(77));
        assert_eq!(parsed.confidence, 0.92);
        assert_eq!(parsed.reasoning.as_deref(), Some("Emissions table"));
    }

    #[test]
    fn test_parse_labeled_reply_sentinels() {
        let parsed = parse_labeled_reply("VALUE: Not found\nPAGE: N/A\nCONFIDENCE: high");
        assert_eq!(parsed.value, None);
        assert_eq!(parsed.page, None);
        assert_eq!(parsed.confidence, UNPARSEABLE_CONFIDENCE);

        let parsed = parse_labeled_reply("VALUE: none");
        assert_eq!(parsed.value, None);
        assert_eq!(parsed.confidence, 0.0);
    }

    #[test]
    fn test_parse_labeled_reply_rejects_page_zero() {
        assert_eq!(parse_labeled_reply("VALUE: 42\nPAGE: 0").page, None);
        assert_eq!(parse_labeled_reply("PAGE: 1").page, Some(1));
    }

    #[test]
    fn test_parse_labeled_reply_clamps() {
        assert_eq!(parse_labeled_reply("CONFIDENCE: 1.7").confidence, 1.0);
    }

    #[test]
    fn test_format_hits_one_header_per_page() {
        let hits = vec![
            IndexHit { text: " a ".into(), page: 3, score: 0.834 },
            IndexHit { text: "b".into(), page: 3, score: 0.7 },
            IndexHit { text: "c".into(), page: 5, score: 0.5 },
        ];
        assert_eq!(
            format_hits(&hits),
            "\n--- Page 3 (relevance: 0.83) ---\n\na\n\nb\n\n\n--- Page 5 (relevance: 0.50) ---\n\nc"
        );
    }

    fn strategy(mock: MockModel) -> FastVectorStrategy<MockModel, EmbeddingIndex<HashEmbedder>> {
        let settings = ModelSettings::new()
            .with_default_model("m")
            .with_backup_models(Vec::<String>::new())
            .with_fallback_backoff(Duration::ZERO);
        FastVectorStrategy::new(
            Arc::new(ModelGateway::new(mock, settings)),
            EmbeddingIndex::new(HashEmbedder::default()),
            ExtractionConfig::default(),
        )
    }

    fn document() -> InMemoryDocument {
        InMemoryDocument::new(
            "report.pdf",
            [
                "Our total greenhouse gas emissions for scope 1 and scope 2 were 1,234 tCO2e \
                 during the reporting year, a decrease of four percent.",
                "The company employed 12,500 people at year end across all regions and \
                 business units, measured as full-time equivalents.",
            ],
        )
    }

    #[tokio::test]
    async fn test_batch_one_call_per_indicator() {
        let mock = MockModel::new().with_default_reply(
            "VALUE: 1,234 tCO2e\nPAGE: 1\nCONFIDENCE: 0.9\nREASONING: Found on page 1",
        );
        let strategy = strategy(mock.clone());
        let indicators = vec![
            Indicator::new("E1-1", "Total GHG Emissions", Category::Environmental, "", "tCO2e"),
            Indicator::new("S1-1", "Total Employees", Category::Social, "", "FTE"),
        ];

        let results = strategy.extract_batch(&indicators, &document()).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(mock.call_count(), 2);
        assert_eq!(strategy.index().chunk_count(), 2);
        assert_eq!(results[0].numeric_value, Some(1234.0));
        assert_eq!(results[0].unit.as_deref(), Some("tCO2e"));
        assert_eq!(results[1].unit.as_deref(), Some("FTE"));
        assert!(mock.calls().iter().all(|c| c.max_tokens == 500));
        assert!(mock.calls()[0].prompt.contains("--- Page 1 (relevance:"));
    }

    #[tokio::test]
    async fn test_no_retry_on_failure() {
        let mock = MockModel::new().with_failing_model("m");
        let strategy = strategy(mock.clone());
        let indicators = vec![Indicator::new(
            "E1-1",
            "Total GHG Emissions",
            Category::Environmental,
            "",
            "tCO2e",
        )];

        let results = strategy.extract_batch(&indicators, &document()).await.unwrap();
        assert_eq!(mock.call_count(), 1);
        assert_eq!(results[0].confidence(), 0.0);
    }

    #[tokio::test]
    async fn test_with_embedder_applies_index_config() {
        let dir = tempfile::tempdir().unwrap();
        let settings = ModelSettings::new()
            .with_default_model("m")
            .with_fallback_backoff(Duration::ZERO);
        let config = ExtractionConfig::default()
            .with_index_cache_dir(dir.path())
            .with_vector_min_chunk_chars(200);
        let strategy = FastVectorStrategy::with_embedder(
            Arc::new(ModelGateway::new(MockModel::new(), settings)),
            HashEmbedder::default(),
            config,
        );

        let document = document();
        let chunks = strategy.index_document(&document).await.unwrap();

        // Both pages are under 200 characters.
        assert_eq!(chunks, 0);
        assert!(strategy.index().cache_path("report.pdf").unwrap().exists());
    }
}
