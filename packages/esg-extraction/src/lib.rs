//! ESG Indicator Extraction Library
//!
//! Extracts environmental, social and governance indicator values from
//! sustainability report PDFs with language-model calls, using one of three
//! interchangeable strategies.
//!
//! # Design
//!
//! - Not-found is a result, not an error: every requested indicator yields
//!   exactly one [`ExtractionResult`], with confidence in `[0, 1]`
//! - Every loop is bounded (agent iterations, pipeline attempts, top-k)
//! - Backends sit behind traits: documents, models, embeddings, storage
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use esg_extraction::{catalog, Extractor, ExtractionConfig, ModelGateway, ModelSettings};
//! use esg_extraction::documents::PdfSource;
//! use esg_extraction::pipeline::AgentStrategy;
//! use esg_extraction::ai::AiClient;
//!
//! let gateway = Arc::new(ModelGateway::new(AiClient::from_env()?, ModelSettings::from_env()?));
//! let config = ExtractionConfig::default();
//! let extractor = Extractor::new(PdfSource::new(), AgentStrategy::new(gateway, config.clone()), config);
//!
//! let report = extractor.run("data/reports/report.pdf", catalog::all()).await;
//! println!("quality: {:.2}", report.quality.quality_score);
//! ```
//!
//! # Modules
//!
//! - [`catalog`] - The fixed set of ESG indicators
//! - [`traits`] - Core trait abstractions (DocumentAccess, LanguageModel, SemanticIndex, ResultStore)
//! - [`types`] - Indicators, results, configuration, run state
//! - [`gateway`] - Model calls with ordered fallback
//! - [`pipeline`] - Strategies, orchestration and quality scoring
//! - [`documents`] - Document sources (in-memory, PDF)
//! - [`index`] - Semantic index with on-disk cache
//! - [`stores`] - Result stores (memory, SQLite)
//! - [`testing`] - Mock implementations for testing

pub mod catalog;
pub mod documents;
pub mod error;
pub mod gateway;
pub mod index;
pub mod numeric;
pub mod pipeline;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

#[cfg(feature = "openai")]
pub mod ai;

// Re-export core types at crate root
pub use error::{DocumentError, ExtractionError, IndexError, ModelError, Result, ToolError};
pub use gateway::ModelGateway;
pub use numeric::{find_numeric, parse_numeric};
pub use traits::{
    document::{DocumentAccess, DocumentSource, KeywordPage, SearchHit, Table, TextChunk},
    index::{cosine_similarity, Embedder, IndexHit, SemanticIndex},
    model::{LanguageModel, ModelRequest},
    store::{RecordFilter, ResultStore, StoredRecord},
};
pub use types::{
    config::{ExtractionConfig, ModelSettings},
    context::CandidateContext,
    indicator::{Category, Indicator},
    result::{ExtractionMethod, ExtractionResult, Outcome},
    run::{ExtractionRun, RunReport, RunStatus},
};

// Re-export pipeline components
pub use pipeline::{
    quality, render_report, AgentStrategy, ContextPreparer, ExtractionStrategy, Extractor,
    FastVectorStrategy, FixedPipelineStrategy, QualityMetrics,
};

// Re-export backends
pub use documents::{InMemoryDocument, InMemorySource};
pub use index::{EmbeddingIndex, HashEmbedder};
pub use stores::MemoryResultStore;

#[cfg(feature = "pdf")]
pub use documents::PdfSource;

#[cfg(feature = "sqlite")]
pub use stores::SqliteResultStore;

// Re-export testing utilities
pub use testing::MockModel;
