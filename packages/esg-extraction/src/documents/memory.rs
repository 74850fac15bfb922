//! In-memory documents for testing and for callers that already hold page text.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{DocumentError, DocumentResult};
use crate::traits::document::{DocumentAccess, DocumentSource, Table};

/// A document held as a list of page strings.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocument {
    id: String,
    pages: Vec<String>,
    tables: HashMap<usize, Vec<Table>>,
}

impl InMemoryDocument {
    /// Create a document from page texts (page 1 first).
    pub fn new(id: impl Into<String>, pages: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            id: id.into(),
            pages: pages.into_iter().map(|p| p.into()).collect(),
            tables: HashMap::new(),
        }
    }

    /// Attach a table to a page.
    pub fn with_table(mut self, page: usize, table: Table) -> Self {
        self.tables.entry(page).or_default().push(table);
        self
    }
}

impl DocumentAccess for InMemoryDocument {
    fn id(&self) -> &str {
        &self.id
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, page: usize) -> DocumentResult<String> {
        self.check_page(page)?;
        Ok(self.pages[page - 1].clone())
    }

    fn tables(&self, page: usize) -> DocumentResult<Vec<Table>> {
        self.check_page(page)?;
        Ok(self.tables.get(&page).cloned().unwrap_or_default())
    }
}

/// A [`DocumentSource`] serving registered in-memory documents by reference.
#[derive(Default)]
pub struct InMemorySource {
    documents: RwLock<HashMap<String, InMemoryDocument>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document under its id.
    pub fn with_document(self, document: InMemoryDocument) -> Self {
        self.insert(document);
        self
    }

    /// Register a document under its id, replacing any previous one.
    pub fn insert(&self, document: InMemoryDocument) {
        self.documents
            .write()
            .unwrap()
            .insert(document.id.clone(), document);
    }
}

#[async_trait]
impl DocumentSource for InMemorySource {
    async fn open(&self, reference: &str) -> DocumentResult<Box<dyn DocumentAccess>> {
        let document = self
            .documents
            .read()
            .unwrap()
            .get(reference)
            .cloned()
            .ok_or_else(|| DocumentError::NotFound(reference.to_string()))?;
        Ok(Box::new(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> InMemoryDocument {
        InMemoryDocument::new(
            "report.pdf",
            [
                "Introduction\nOur purpose",
                "Climate\nScope 1 emissions: 1,234 tCO2e\nScope 2 emissions: 567 tCO2e",
                "Workforce\nHeadcount 12,500 FTE",
                "Governance\nBoard met 11 times",
                "Appendix",
            ],
        )
        .with_table(2, vec![vec!["Scope".into(), "tCO2e".into()], vec!["1".into(), "1,234".into()]])
    }

    #[test]
    fn test_page_text_bounds() {
        let doc = report();
        assert!(doc.page_text(1).unwrap().starts_with("Introduction"));
        assert!(matches!(
            doc.page_text(0),
            Err(DocumentError::PageOutOfRange { page: 0, count: 5 })
        ));
        assert!(doc.page_text(6).is_err());
    }

    #[test]
    fn test_search_case_insensitive_with_context() {
        let hits = report().search("scope 1", false).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].page, 2);
        assert!(hits[0].snippet.contains("Climate"));
        assert!(hits[0].snippet.contains("Scope 2"));

        assert!(report().search("scope 1", true).unwrap().is_empty());
    }

    #[test]
    fn test_search_invalid_pattern() {
        assert!(matches!(
            report().search("(", false),
            Err(DocumentError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_page_range_text() {
        let text = report().page_range_text(2, 3).unwrap();
        assert!(text.contains("--- Page 2 ---"));
        assert!(text.contains("--- Page 3 ---"));
        assert!(!text.contains("--- Page 4 ---"));
        assert!(report().page_range_text(4, 9).is_err());
        assert!(report().page_range_text(3, 2).is_err());
    }

    #[test]
    fn test_section_by_keywords_window() {
        let pages = report()
            .section_by_keywords(&["headcount".to_string()], 1)
            .unwrap();
        let numbers: Vec<usize> = pages.iter().map(|p| p.page).collect();
        assert_eq!(numbers, vec![2, 3, 4]);
        assert!(pages[1].direct_match);
        assert!(!pages[0].direct_match);
    }

    #[test]
    fn test_section_by_keywords_unions_and_clamps() {
        let pages = report()
            .section_by_keywords(&["purpose".to_string(), "appendix".to_string()], 1)
            .unwrap();
        let numbers: Vec<usize> = pages.iter().map(|p| p.page).collect();
        assert_eq!(numbers, vec![1, 2, 4, 5]);
    }

    #[test]
    fn test_tables() {
        let doc = report();
        assert_eq!(doc.tables(2).unwrap().len(), 1);
        assert!(doc.tables(1).unwrap().is_empty());
        assert!(doc.tables(9).is_err());
    }

    #[test]
    fn test_chunk_text_skips_blank_pages() {
        let doc = InMemoryDocument::new("d", ["", "   ", "text"]);
        let chunks = doc.chunk_text(100, 10).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].page_number, 3);
    }

    #[tokio::test]
    async fn test_source_open() {
        let source = InMemorySource::new().with_document(report());
        let doc = source.open("report.pdf").await.unwrap();
        assert_eq!(doc.page_count(), 5);
        assert!(matches!(
            source.open("missing.pdf").await,
            Err(DocumentError::NotFound(_))
        ));
    }
}
