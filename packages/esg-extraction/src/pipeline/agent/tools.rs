//! Document tools available to the extraction agent.
//!
//! The tool set is closed: a model's `TOOL:`/`INPUT:` directive is decoded
//! into a [`ToolInvocation`] at the boundary, so an unknown name or ill-typed
//! argument is rejected before anything touches the document. Every outcome,
//! including failures, is rendered as a JSON observation for the next turn.

use schemars::JsonSchema;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ToolError;
use crate::pipeline::prompts::truncate_chars;
use crate::traits::document::{DocumentAccess, Table};

/// Hits returned by `search_pdf` and `search_by_keywords`.
const MAX_RESULTS: usize = 5;
const SEARCH_CONTEXT_CHARS: usize = 500;
const PAGE_CONTENT_CHARS: usize = 4000;
const PAGE_RANGE_CHARS: usize = 6000;
const KEYWORD_CONTENT_CHARS: usize = 800;
const TABLE_PREVIEW_ROWS: usize = 10;
const KEYWORD_CONTEXT_PAGES: usize = 1;

// =============================================================================
// Tool Arguments
// =============================================================================

/// Arguments for `search_pdf`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SearchPdfArgs {
    /// Search terms (a case-insensitive regular expression).
    #[serde(default)]
    pub query: String,
}

/// Arguments for tools addressing a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PageArgs {
    /// 1-indexed page number.
    #[serde(default = "first_page", deserialize_with = "page_number")]
    pub page_number: usize,
}

/// Arguments for `get_page_range`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PageRangeArgs {
    /// First page, inclusive.
    #[serde(default = "first_page", deserialize_with = "page_number")]
    pub start_page: usize,

    /// Last page, inclusive.
    #[serde(default = "first_page", deserialize_with = "page_number")]
    pub end_page: usize,
}

/// Arguments for `search_by_keywords`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct KeywordsArgs {
    /// Related keywords; a page matching any of them is returned.
    #[serde(default, deserialize_with = "keyword_list")]
    pub keywords: Vec<String>,
}

fn first_page() -> usize {
    1
}

/// Accept `4`, `4.0` and `"4"`.
fn page_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Float(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(n) => usize::try_from(n).map_err(de::Error::custom),
        Raw::Float(f) if f >= 0.0 && f.fract() == 0.0 => Ok(f as usize),
        Raw::Float(f) => Err(de::Error::custom(format!("invalid page number {}", f))),
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid page number {:?}", s))),
    }
}

/// Accept a list of strings or a single comma-separated string.
fn keyword_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::List(list) => list,
        Raw::Text(s) => s
            .split(',')
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect(),
    })
}

// =============================================================================
// Tool Outputs
// =============================================================================

/// A page hit from `search_pdf`.
#[derive(Debug, Serialize)]
pub struct SearchResultOutput {
    pub page: usize,
    pub context: String,
}

/// A page from `search_by_keywords`.
#[derive(Debug, Serialize)]
pub struct KeywordResultOutput {
    pub page: usize,
    pub content: String,
}

/// A table preview from `extract_table`.
#[derive(Debug, Serialize)]
pub struct TableOutput {
    pub table_number: usize,
    pub rows: usize,
    pub columns: usize,
    pub data: Table,
}

// =============================================================================
// Invocation
// =============================================================================

/// A decoded tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool", content = "input", rename_all = "snake_case")]
pub enum ToolInvocation {
    SearchPdf(SearchPdfArgs),
    GetPageContent(PageArgs),
    ExtractTable(PageArgs),
    GetPageRange(PageRangeArgs),
    SearchByKeywords(KeywordsArgs),
}

impl ToolInvocation {
    /// Tool names, in catalog order.
    pub const NAMES: [&'static str; 5] = [
        "search_pdf",
        "get_page_content",
        "extract_table",
        "get_page_range",
        "search_by_keywords",
    ];

    /// Decode a tool name and its JSON input.
    pub fn from_call(name: &str, input: Value) -> Result<Self, ToolError> {
        if !Self::NAMES.contains(&name) {
            return Err(ToolError::UnknownTool(name.to_string()));
        }
        serde_json::from_value(json!({ "tool": name, "input": input })).map_err(|e| {
            ToolError::InvalidInput {
                tool: name.to_string(),
                reason: e.to_string(),
            }
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SearchPdf(_) => "search_pdf",
            Self::GetPageContent(_) => "get_page_content",
            Self::ExtractTable(_) => "extract_table",
            Self::GetPageRange(_) => "get_page_range",
            Self::SearchByKeywords(_) => "search_by_keywords",
        }
    }

    /// Run the tool against a document.
    pub fn execute(&self, document: &dyn DocumentAccess) -> Result<Value, ToolError> {
        match self {
            Self::SearchPdf(args) => {
                let hits = document.search(&args.query, false)?;
                if hits.is_empty() {
                    return Ok(json!({
                        "found": false,
                        "message": format!("No pages found containing '{}'", args.query),
                    }));
                }
                let results: Vec<SearchResultOutput> = hits
                    .iter()
                    .take(MAX_RESULTS)
                    .map(|h| SearchResultOutput {
                        page: h.page,
                        context: truncate_chars(&h.snippet, SEARCH_CONTEXT_CHARS).to_string(),
                    })
                    .collect();
                Ok(json!({
                    "found": true,
                    "total_pages": hits.len(),
                    "results": results,
                }))
            }

            Self::GetPageContent(args) => {
                let text = document.page_text(args.page_number)?;
                Ok(json!({
                    "page": args.page_number,
                    "content": truncate_chars(&text, PAGE_CONTENT_CHARS),
                }))
            }

            Self::ExtractTable(args) => {
                let tables = document.tables(args.page_number)?;
                if tables.is_empty() {
                    return Ok(json!({
                        "found": false,
                        "message": format!("No tables found on page {}", args.page_number),
                    }));
                }
                let tables: Vec<TableOutput> = tables
                    .into_iter()
                    .enumerate()
                    .map(|(i, table)| TableOutput {
                        table_number: i + 1,
                        rows: table.len(),
                        columns: table.first().map(Vec::len).unwrap_or(0),
                        data: table.into_iter().take(TABLE_PREVIEW_ROWS).collect(),
                    })
                    .collect();
                Ok(json!({
                    "found": true,
                    "page": args.page_number,
                    "num_tables": tables.len(),
                    "tables": tables,
                }))
            }

            Self::GetPageRange(args) => {
                let text = document.page_range_text(args.start_page, args.end_page)?;
                Ok(json!({
                    "start_page": args.start_page,
                    "end_page": args.end_page,
                    "content": truncate_chars(&text, PAGE_RANGE_CHARS),
                }))
            }

            Self::SearchByKeywords(args) => {
                let pages = document.section_by_keywords(&args.keywords, KEYWORD_CONTEXT_PAGES)?;
                if pages.is_empty() {
                    return Ok(json!({
                        "found": false,
                        "message": format!(
                            "No pages found containing keywords: {}",
                            args.keywords.join(", ")
                        ),
                    }));
                }
                let results: Vec<KeywordResultOutput> = pages
                    .iter()
                    .take(MAX_RESULTS)
                    .map(|p| KeywordResultOutput {
                        page: p.page,
                        content: truncate_chars(&p.text, KEYWORD_CONTENT_CHARS).to_string(),
                    })
                    .collect();
                Ok(json!({
                    "found": true,
                    "keywords_used": args.keywords,
                    "total_pages": pages.len(),
                    "results": results,
                }))
            }
        }
    }
}

/// Decode and run a tool call, rendering any failure as `{"error": ...}`.
pub fn run_tool(name: &str, input: Value, document: &dyn DocumentAccess) -> String {
    let outcome = ToolInvocation::from_call(name, input).and_then(|call| call.execute(document));
    match outcome {
        Ok(payload) => payload.to_string(),
        Err(e) => json!({ "error": e.to_string() }).to_string(),
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Description of one tool for prompts.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: &'static str,
    /// One-line summary for the system turn
    pub summary: &'static str,
    pub description: &'static str,
    /// JSON schema of the argument object's properties
    pub parameters: Value,
}

fn parameters<T: JsonSchema>() -> Value {
    let schema = serde_json::to_value(schemars::schema_for!(T)).unwrap_or_default();
    schema.get("properties").cloned().unwrap_or_default()
}

/// All tools, in catalog order.
pub fn catalog() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: "search_pdf",
            summary: "Search for keywords in the document",
            description: "Searches the PDF for pages containing specific keywords. \
                Use this to find relevant sections of the document. \
                Returns page numbers and text snippets where the terms were found.",
            parameters: parameters::<SearchPdfArgs>(),
        },
        ToolSpec {
            name: "get_page_content",
            summary: "Get full text from a specific page",
            description: "Retrieves the full text content from a specific page number. \
                Use this after finding relevant pages to get detailed content.",
            parameters: parameters::<PageArgs>(),
        },
        ToolSpec {
            name: "extract_table",
            summary: "Extract tables from a page",
            description: "Extracts structured tables from a specific page. \
                Use this when you find data in tabular format.",
            parameters: parameters::<PageArgs>(),
        },
        ToolSpec {
            name: "get_page_range",
            summary: "Get content from multiple pages",
            description: "Retrieves content from a range of pages. \
                Use this when relevant information spans multiple pages.",
            parameters: parameters::<PageRangeArgs>(),
        },
        ToolSpec {
            name: "search_by_keywords",
            summary: "Search using multiple keywords at once",
            description: "Searches the PDF using multiple related keywords at once. \
                Use this to find sections relevant to an indicator using all its keywords. \
                Returns pages containing any of the keywords.",
            parameters: parameters::<KeywordsArgs>(),
        },
    ]
}

/// `- name: summary` lines for the agent system turn.
pub fn render_summaries(tools: &[ToolSpec]) -> String {
    tools
        .iter()
        .map(|t| format!("- {}: {}", t.name, t.summary))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `- name: description` lines with the argument schema, for every turn.
pub fn render_descriptions(tools: &[ToolSpec]) -> String {
    tools
        .iter()
        .map(|t| format!("- {}: {}\n  Input schema: {}", t.name, t.description, t.parameters))
        .collect::<Vec<_>>()
        .join("\n")
}
