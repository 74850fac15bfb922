//! Candidate context selection.
//!
//! Keyword pages come first; sequential chunks are used only when no page
//! mentions any of the indicator's keywords.

use tracing::{debug, warn};

use crate::error::DocumentResult;
use crate::traits::document::DocumentAccess;
use crate::types::config::ExtractionConfig;
use crate::types::context::CandidateContext;
use crate::types::indicator::Indicator;

/// Relevance of a page that matched a keyword itself.
pub const DIRECT_MATCH_RELEVANCE: f32 = 1.0;

/// Relevance of a page pulled in as a window neighbour.
pub const NEIGHBOUR_RELEVANCE: f32 = 0.5;

/// Relevance of a fallback chunk.
pub const FALLBACK_RELEVANCE: f32 = 0.1;

/// Builds ranked candidate passages for an indicator.
#[derive(Debug, Clone, Default)]
pub struct ContextPreparer {
    config: ExtractionConfig,
}

impl ContextPreparer {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Candidate contexts for `indicator`, best first.
    ///
    /// Returns an empty list only when the document has no non-blank text.
    pub fn prepare(
        &self,
        indicator: &Indicator,
        document: &dyn DocumentAccess,
    ) -> DocumentResult<Vec<CandidateContext>> {
        let pages =
            document.section_by_keywords(&indicator.keywords, self.config.context_pages)?;

        if !pages.is_empty() {
            let contexts: Vec<CandidateContext> = pages
                .into_iter()
                .take(self.config.max_keyword_contexts)
                .map(|p| {
                    let relevance = if p.direct_match {
                        DIRECT_MATCH_RELEVANCE
                    } else {
                        NEIGHBOUR_RELEVANCE
                    };
                    CandidateContext::new(p.text)
                        .with_page(p.page)
                        .with_relevance(relevance)
                })
                .collect();
            debug!(indicator = %indicator.code, contexts = contexts.len(), "Keyword contexts");
            return Ok(contexts);
        }

        warn!(indicator = %indicator.code, "No keyword pages found, using chunks");
        let contexts: Vec<CandidateContext> = document
            .chunk_text(
                self.config.fallback_chunk_size,
                self.config.fallback_chunk_overlap,
            )?
            .into_iter()
            .take(self.config.max_fallback_chunks)
            .map(|c| {
                CandidateContext::new(c.text)
                    .with_page(c.page_number)
                    .with_relevance(FALLBACK_RELEVANCE)
            })
            .collect();
        debug!(indicator = %indicator.code, contexts = contexts.len(), "Fallback contexts");
        Ok(contexts)
    }
}
