//! Document access traits.
//!
//! A [`DocumentSource`] opens a report; the returned [`DocumentAccess`]
//! handle gives page-level text and tables. Search, page ranges, keyword
//! sections and chunking are provided on top of `page_text`, so a backend
//! only needs to supply raw pages.
//!
//! Pages are 1-indexed everywhere.

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{DocumentError, DocumentResult};

/// A table as rows of cells.
pub type Table = Vec<Vec<String>>;

/// Lines kept on each side of a search match.
const SNIPPET_CONTEXT_LINES: usize = 2;

/// A page that matched a search, with the surrounding lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub page: usize,
    /// Matched lines with two lines of context each, joined by `\n...\n`
    pub snippet: String,
}

/// A page selected by keyword search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordPage {
    pub page: usize,
    pub text: String,
    /// `true` when the page itself matched, `false` for a window neighbour
    pub direct_match: bool,
}

/// A sequential chunk of page text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    pub text: String,
    pub page_number: usize,
    /// Character offset of the chunk start within the page
    pub start_char: usize,
    /// Character offset one past the chunk end
    pub end_char: usize,
}

/// Opens documents by reference (usually a file path).
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Open a document.
    ///
    /// Fails with [`DocumentError::NotFound`] when the reference does not
    /// resolve.
    async fn open(&self, reference: &str) -> DocumentResult<Box<dyn DocumentAccess>>;
}

/// Page-level read access to an open document.
///
/// Resources are released when the handle is dropped.
pub trait DocumentAccess: Send + Sync {
    /// Stable identifier (the path the document was opened from).
    fn id(&self) -> &str;

    /// Number of pages.
    fn page_count(&self) -> usize;

    /// Text of one page.
    fn page_text(&self, page: usize) -> DocumentResult<String>;

    /// Tables on one page. Backends without table support return an empty list.
    fn tables(&self, page: usize) -> DocumentResult<Vec<Table>> {
        self.check_page(page)?;
        Ok(Vec::new())
    }

    /// Fail with [`DocumentError::PageOutOfRange`] unless `1 <= page <= page_count`.
    fn check_page(&self, page: usize) -> DocumentResult<()> {
        let count = self.page_count();
        if page == 0 || page > count {
            return Err(DocumentError::PageOutOfRange { page, count });
        }
        Ok(())
    }

    /// All pages as `(page, text)` pairs.
    fn pages(&self) -> DocumentResult<Vec<(usize, String)>> {
        (1..=self.page_count())
            .map(|page| Ok((page, self.page_text(page)?)))
            .collect()
    }

    /// Regex search across all pages.
    ///
    /// Returns one hit per matching page, in page order.
    fn search(&self, pattern: &str, case_sensitive: bool) -> DocumentResult<Vec<SearchHit>> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(!case_sensitive)
            .build()?;

        let mut hits = Vec::new();
        for (page, text) in self.pages()? {
            if let Some(snippet) = snippet_for(&regex, &text) {
                hits.push(SearchHit { page, snippet });
            }
        }
        Ok(hits)
    }

    /// Text of an inclusive page range, each page under a `--- Page N ---` header.
    fn page_range_text(&self, start: usize, end: usize) -> DocumentResult<String> {
        let count = self.page_count();
        if start < 1 || end > count || start > end {
            return Err(DocumentError::InvalidRange { start, end, count });
        }

        let mut parts = Vec::with_capacity(end - start + 1);
        for page in start..=end {
            parts.push(format!("\n--- Page {} ---\n{}", page, self.page_text(page)?));
        }
        Ok(parts.join("\n"))
    }

    /// Pages containing any keyword (literal, case-insensitive), widened by
    /// `context_pages` on each side, in ascending page order.
    fn section_by_keywords(
        &self,
        keywords: &[String],
        context_pages: usize,
    ) -> DocumentResult<Vec<KeywordPage>> {
        let Some(regex) = keyword_regex(keywords)? else {
            return Ok(Vec::new());
        };

        let count = self.page_count();
        let mut selected = vec![None::<bool>; count + 1];
        for (page, text) in self.pages()? {
            if !regex.is_match(&text) {
                continue;
            }
            let lo = page.saturating_sub(context_pages).max(1);
            let hi = (page + context_pages).min(count);
            for p in lo..=hi {
                let direct = p == page || selected[p] == Some(true);
                selected[p] = Some(direct);
            }
        }

        let mut pages = Vec::new();
        for (page, direct) in selected.into_iter().enumerate() {
            if let Some(direct_match) = direct {
                pages.push(KeywordPage {
                    page,
                    text: self.page_text(page)?,
                    direct_match,
                });
            }
        }
        Ok(pages)
    }

    /// Split every non-blank page into chunks of at most `size` characters.
    ///
    /// A page that fits is kept whole; longer pages are cut into windows that
    /// overlap by `overlap` characters, the last window ending at the page end.
    fn chunk_text(&self, size: usize, overlap: usize) -> DocumentResult<Vec<TextChunk>> {
        let mut chunks = Vec::new();
        for (page, text) in self.pages()? {
            if text.trim().is_empty() {
                continue;
            }
            chunks.extend(chunk_page(page, &text, size, overlap));
        }
        Ok(chunks)
    }
}

/// Cut one page into overlapping character windows.
pub fn chunk_page(page: usize, text: &str, size: usize, overlap: usize) -> Vec<TextChunk> {
    let chars: Vec<char> = text.chars().collect();
    let size = size.max(1);

    if chars.len() <= size {
        return vec![TextChunk {
            text: text.to_string(),
            page_number: page,
            start_char: 0,
            end_char: chars.len(),
        }];
    }

    let step = size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + size).min(chars.len());
        chunks.push(TextChunk {
            text: chars[start..end].iter().collect(),
            page_number: page,
            start_char: start,
            end_char: end,
        });
        if end >= chars.len() {
            break;
        }
        start += step;
    }
    chunks
}

fn snippet_for(regex: &Regex, text: &str) -> Option<String> {
    let lines: Vec<&str> = text.split('\n').collect();
    let contexts: Vec<String> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| regex.is_match(line))
        .map(|(i, _)| {
            let start = i.saturating_sub(SNIPPET_CONTEXT_LINES);
            let end = (i + SNIPPET_CONTEXT_LINES + 1).min(lines.len());
            lines[start..end].join("\n")
        })
        .collect();

    if contexts.is_empty() {
        None
    } else {
        Some(contexts.join("\n...\n"))
    }
}

fn keyword_regex(keywords: &[String]) -> DocumentResult<Option<Regex>> {
    let escaped: Vec<String> = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(regex::escape)
        .collect();

    if escaped.is_empty() {
        return Ok(None);
    }

    let regex = RegexBuilder::new(&escaped.join("|"))
        .case_insensitive(true)
        .build()?;
    Ok(Some(regex))
}
