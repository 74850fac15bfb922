//! Candidate contexts handed from the context preparer to a strategy.

use serde::{Deserialize, Serialize};

/// A passage that may contain an indicator's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateContext {
    /// Passage text
    pub text: String,

    /// 1-indexed page the passage came from
    pub page_number: Option<usize>,

    /// How strongly the passage matched (higher is better)
    pub relevance_score: Option<f32>,
}

impl CandidateContext {
    /// Create a context with no page or score.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            page_number: None,
            relevance_score: None,
        }
    }

    /// Set the source page.
    pub fn with_page(mut self, page: usize) -> Self {
        self.page_number = Some(page);
        self
    }

    /// Set the relevance score.
    pub fn with_relevance(mut self, score: f32) -> Self {
        self.relevance_score = Some(score);
        self
    }
}
