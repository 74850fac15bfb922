//! Indicator definitions.

use serde::{Deserialize, Serialize};

/// ESG category of an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Environmental (ESRS E1, climate change)
    #[serde(rename = "E")]
    Environmental,

    /// Social (ESRS S1, own workforce)
    #[serde(rename = "S")]
    Social,

    /// Governance (ESRS G1)
    #[serde(rename = "G")]
    Governance,

    /// General disclosures (ESRS 2)
    #[serde(rename = "ESRS2")]
    Esrs2,
}

impl Category {
    /// Short label used in reports and storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Environmental => "E",
            Self::Social => "S",
            Self::Governance => "G",
            Self::Esrs2 => "ESRS2",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Definition of an ESG indicator to extract.
///
/// Immutable once defined; the standard set lives in [`crate::catalog`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    /// Unique code (e.g., "E1-1")
    pub code: String,

    /// Human-readable name
    pub name: String,

    /// ESG category
    pub category: Category,

    /// What the indicator measures
    pub description: String,

    /// Unit the value is expected in (e.g., "tCO2e")
    pub expected_unit: String,

    /// Search keywords, most specific first
    pub keywords: Vec<String>,
}

impl Indicator {
    /// Create a new indicator.
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        category: Category,
        description: impl Into<String>,
        expected_unit: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            category,
            description: description.into(),
            expected_unit: expected_unit.into(),
            keywords: Vec::new(),
        }
    }

    /// Set the search keywords.
    pub fn with_keywords(mut self, keywords: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.keywords = keywords.into_iter().map(|k| k.into()).collect();
        self
    }

    /// Code prefix before the first `-` ("E1" for "E1-1").
    ///
    /// Reports group results by this prefix.
    pub fn code_prefix(&self) -> &str {
        code_prefix(&self.code)
    }
}

/// Code prefix before the first `-`, or the whole code when there is none.
pub fn code_prefix(code: &str) -> &str {
    code.split('-').next().unwrap_or(code)
}
