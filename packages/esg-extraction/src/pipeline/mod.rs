//! Extraction pipeline: context preparation, the three strategies, run
//! orchestration and quality scoring.
//!
//! # Strategies
//!
//! - [`AgentStrategy`] - bounded tool-using loop over the document
//! - [`FixedPipelineStrategy`] - keyword contexts, one JSON call per context
//! - [`FastVectorStrategy`] - semantic index plus one call per indicator
//!
//! Each implements [`ExtractionStrategy`]; [`Extractor`] drives any of them.

pub mod agent;
pub mod answer;
pub mod context;
pub mod prompts;
pub mod quality;
pub mod runner;
pub mod simple;
pub mod vector;

pub use agent::AgentStrategy;
pub use answer::ModelAnswer;
pub use context::ContextPreparer;
pub use quality::{quality, render_report, QualityMetrics};
pub use runner::{ExtractionStrategy, Extractor};
pub use simple::FixedPipelineStrategy;
pub use vector::{parse_labeled_reply, FastVectorStrategy, LabeledReply};
