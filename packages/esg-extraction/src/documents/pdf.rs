//! PDF document source backed by `pdf-extract`.
//!
//! Text is extracted once per page when the document is opened. Table
//! extraction is not supported; `tables` returns an empty list.

use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info};

use crate::documents::memory::InMemoryDocument;
use crate::error::{DocumentError, DocumentResult};
use crate::traits::document::{DocumentAccess, DocumentSource};

/// Opens PDF files from the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct PdfSource;

impl PdfSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentSource for PdfSource {
    async fn open(&self, reference: &str) -> DocumentResult<Box<dyn DocumentAccess>> {
        let path = Path::new(reference);
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DocumentError::NotFound(reference.to_string()),
            _ => DocumentError::Backend(format!("{}: {}", reference, e)),
        })?;

        debug!(path = %reference, bytes = bytes.len(), "Read PDF");

        let pages = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem_by_pages(&bytes)
                .map_err(|e| DocumentError::Backend(e.to_string()))
        })
        .await
        .map_err(|e| DocumentError::Backend(format!("PDF extraction task failed: {}", e)))??;

        info!(path = %reference, pages = pages.len(), "Opened PDF");
        Ok(Box::new(InMemoryDocument::new(reference, pages)))
    }
}
