//! Integration tests for full extraction runs.
//!
//! These drive each strategy through [`Extractor::run`] against in-memory
//! documents and a scripted model:
//! 1. One result per indicator, in request order
//! 2. Degraded results instead of aborted batches
//! 3. Semantic index cache reuse across index instances
//! 4. Results flowing into a store

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use esg_extraction::{
    catalog, AgentStrategy, DocumentAccess, Embedder, EmbeddingIndex, ExtractionConfig,
    ExtractionMethod, ExtractionStrategy, Extractor, FastVectorStrategy, FixedPipelineStrategy,
    HashEmbedder, InMemoryDocument, InMemorySource, MemoryResultStore, MockModel, ModelGateway,
    ModelSettings, RecordFilter, ResultStore, RunStatus, SemanticIndex,
};
use esg_extraction::error::IndexResult;

const REPORT: &str = "reports/acme-2024.pdf";

/// Helper to create a small sustainability report.
fn report() -> InMemoryDocument {
    InMemoryDocument::new(
        REPORT,
        [
            "Acme Group Sustainability Report 2024. This report covers all operations \
             of the group for the financial year ending 31 December 2024.",
            "Climate. Our Scope 1 direct emissions were 1,234 tCO2e in 2024, and scope 2 \
             emissions from purchased electricity were 567 tCO2e.",
            "Own workforce. At year end the group employed 12,500 people measured as \
             full-time equivalents, with a gender pay gap of 8.5%.",
            "Business conduct. The board met 11 times during the year and there were no \
             confirmed incidents of corruption or bribery.",
        ],
    )
}

fn source() -> InMemorySource {
    InMemorySource::new().with_document(report())
}

fn gateway(mock: MockModel) -> Arc<ModelGateway<MockModel>> {
    let settings = ModelSettings::new()
        .with_default_model("primary")
        .with_backup_models(["backup"])
        .with_fallback_backoff(Duration::ZERO);
    Arc::new(ModelGateway::new(mock, settings))
}

fn indicators() -> Vec<esg_extraction::Indicator> {
    catalog::select(&["E1-1", "E1-2", "S1-1", "G1-1"])
}

/// Embedder that counts batch calls.
#[derive(Clone, Default)]
struct CountingEmbedder {
    inner: HashEmbedder,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Embedder for CountingEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> IndexResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed_batch(texts).await
    }
}

#[tokio::test]
async fn test_agent_run_returns_one_result_per_indicator() {
    let mock = MockModel::new().with_default_reply(
        "FINAL ANSWER: {\"value\": \"1,234 tCO2e\", \"confidence\": 0.9, \
         \"source_page\": 2, \"found\": true}",
    );
    let config = ExtractionConfig::default();
    let extractor = Extractor::new(
        source(),
        AgentStrategy::new(gateway(mock.clone()), config.clone()),
        config,
    );

    let indicators = indicators();
    let report = extractor.run(REPORT, &indicators).await;

    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(report.method, ExtractionMethod::Agent);
    let codes: Vec<&str> = report.results.iter().map(|r| r.indicator_code.as_str()).collect();
    assert_eq!(codes, vec!["E1-1", "E1-2", "S1-1", "G1-1"]);
    assert_eq!(mock.call_count(), 4);
    assert_eq!(report.quality.found, 4);
    assert!(report.errors.is_empty());
}

#[tokio::test]
async fn test_agent_iteration_cap_is_configurable() {
    let mock = MockModel::new().with_default_reply("I am still looking.");
    let config = ExtractionConfig::default().with_max_agent_iterations(3);
    let extractor = Extractor::new(
        source(),
        AgentStrategy::new(gateway(mock.clone()), config.clone()),
        config,
    );

    let report = extractor.run(REPORT, &indicators()[..2]).await;

    assert_eq!(mock.call_count(), 6);
    assert!(report.results.iter().all(|r| r.confidence() == 0.0));
    assert_eq!(report.quality.found, 0);
    assert_eq!(report.quality.quality_score, 0.0);
}

#[tokio::test]
async fn test_fixed_pipeline_exits_early_per_indicator() {
    let mock = MockModel::new().with_default_reply(
        r#"{"value": "12,500", "unit": "FTE", "confidence": 0.95, "found": true}"#,
    );
    let config = ExtractionConfig::default();
    let extractor = Extractor::new(
        source(),
        FixedPipelineStrategy::new(gateway(mock.clone()), config.clone()),
        config,
    );

    let report = extractor.run(REPORT, &indicators()).await;

    assert_eq!(report.results.len(), 4);
    assert_eq!(mock.call_count(), 4);
    assert!(mock.calls().iter().all(|c| c.structured));
    assert_eq!(report.results[2].numeric_value, Some(12500.0));
}

#[tokio::test]
async fn test_backup_model_serves_when_primary_fails() {
    let mock = MockModel::new()
        .with_failing_model("primary")
        .with_default_reply(r#"{"value": "11", "confidence": 0.9, "found": true}"#);
    let config = ExtractionConfig::default();
    let extractor = Extractor::new(
        source(),
        FixedPipelineStrategy::new(gateway(mock.clone()), config.clone()),
        config,
    );

    let report = extractor.run(REPORT, &indicators()[3..]).await;

    assert_eq!(mock.models_called(), vec!["primary", "backup"]);
    assert_eq!(report.results[0].value.as_deref(), Some("11"));
}

#[tokio::test]
async fn test_all_models_failing_degrades_each_indicator() {
    let mock = MockModel::new()
        .with_failing_model("primary")
        .with_failing_model("backup");
    let config = ExtractionConfig::default();
    let extractor = Extractor::new(
        source(),
        AgentStrategy::new(gateway(mock), config.clone()),
        config,
    );

    let report = extractor.run(REPORT, &indicators()).await;

    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(report.results.len(), 4);
    assert_eq!(report.errors.len(), 4);
    assert!(report.errors[0].starts_with("agent error for E1-1: model error:"));
    assert_eq!(report.results[0].explanation.as_ref(), Some(&report.errors[0]));
}

#[tokio::test]
async fn test_vector_run_makes_one_call_per_indicator() {
    let mock = MockModel::new().with_default_reply(
        "VALUE: 1,234 tCO2e\nPAGE: 2\nCONFIDENCE: 0.8\nREASONING: Climate section",
    );
    let config = ExtractionConfig::default();
    let strategy = FastVectorStrategy::new(
        gateway(mock.clone()),
        EmbeddingIndex::new(HashEmbedder::default()),
        config.clone(),
    );
    let extractor = Extractor::new(source(), strategy, config);

    let report = extractor.run(REPORT, &indicators()).await;

    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(mock.call_count(), 4);
    assert_eq!(extractor.strategy().index().chunk_count(), 4);
    assert!(report
        .results
        .iter()
        .all(|r| r.extraction_method == ExtractionMethod::VectorSearch && r.source_page == Some(2)));
}

#[tokio::test]
async fn test_missing_document_fails_run_with_degraded_results() {
    let mock = MockModel::new().with_default_reply("unused");
    let config = ExtractionConfig::default();
    let extractor = Extractor::new(
        source(),
        FixedPipelineStrategy::new(gateway(mock.clone()), config.clone()),
        config,
    );

    let report = extractor.run("reports/missing.pdf", &indicators()).await;

    assert_eq!(report.status, RunStatus::Error);
    assert_eq!(report.results.len(), 4);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].starts_with("Document open error:"));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_index_cache_is_reused_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let document = report();
    let pages = document.pages().unwrap();
    let embedder = CountingEmbedder::default();

    let first = EmbeddingIndex::new(embedder.clone()).with_cache_dir(dir.path());
    let built = first.build(document.id(), &pages, 600, 100, false).await.unwrap();
    let calls_after_build = embedder.calls.load(Ordering::SeqCst);
    assert!(calls_after_build > 0);
    assert!(first.cache_path(document.id()).unwrap().exists());

    let second = EmbeddingIndex::new(embedder.clone()).with_cache_dir(dir.path());
    let loaded = second.build(document.id(), &pages, 600, 100, false).await.unwrap();
    assert_eq!(loaded, built);
    assert_eq!(embedder.calls.load(Ordering::SeqCst), calls_after_build);

    let rebuilt = second.build(document.id(), &pages, 600, 100, true).await.unwrap();
    assert_eq!(rebuilt, built);
    assert!(embedder.calls.load(Ordering::SeqCst) > calls_after_build);
}

#[tokio::test]
async fn test_run_results_can_be_stored() {
    let mock = MockModel::new().with_default_reply(
        "FINAL ANSWER: {\"value\": \"11\", \"confidence\": 0.7, \"found\": true}",
    );
    let config = ExtractionConfig::default();
    let strategy = Arc::new(AgentStrategy::new(gateway(mock), config.clone()));
    assert_eq!(strategy.method(), ExtractionMethod::Agent);
    let extractor = Extractor::new(source(), strategy, config);

    let report = extractor.run(REPORT, &indicators()).await;
    let store = MemoryResultStore::new();
    let saved = store.save("Acme", 2024, &report.results).await.unwrap();
    assert_eq!(saved, 4);

    let governance = store
        .records(&RecordFilter::new().for_indicator("G1-1"))
        .await
        .unwrap();
    assert_eq!(governance.len(), 1);
    assert_eq!(governance[0].numeric_value, Some(11.0));
    assert_eq!(governance[0].confidence, 0.7);
}
