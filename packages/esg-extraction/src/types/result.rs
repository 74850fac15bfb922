//! Extraction results.
//!
//! Not-found is a first-class outcome, not an error: every requested
//! indicator yields exactly one [`ExtractionResult`], and [`Outcome`] gives a
//! tagged view of whether a value was found.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Which strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Tool-using agent loop
    Agent,
    /// Fixed pipeline over keyword contexts
    Simple,
    /// Semantic index plus a single model call
    VectorSearch,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Simple => "simple",
            Self::VectorSearch => "vector_search",
        }
    }
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clamp a confidence into `[0, 1]`. NaN becomes 0.
pub fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

fn deserialize_confidence<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(clamp_confidence(raw.unwrap_or(0.0)))
}

/// The value (or absence of one) extracted for one indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Indicator code (e.g., "E1-1")
    pub indicator_code: String,

    /// Value as written in the report
    pub value: Option<String>,

    /// Parsed numeric value
    pub numeric_value: Option<f64>,

    /// Unit of the value
    pub unit: Option<String>,

    /// 1-indexed page the value was found on
    pub source_page: Option<usize>,

    /// Sentence or phrase containing the value
    pub source_text: Option<String>,

    /// Always within `[0, 1]`
    #[serde(default, deserialize_with = "deserialize_confidence")]
    confidence: f64,

    /// How the value was found, or why it was not
    pub explanation: Option<String>,

    /// Strategy that produced the result
    pub extraction_method: ExtractionMethod,

    /// When the result was produced
    pub timestamp: DateTime<Utc>,
}

impl ExtractionResult {
    /// Create an empty zero-confidence result.
    pub fn new(indicator_code: impl Into<String>, method: ExtractionMethod) -> Self {
        Self {
            indicator_code: indicator_code.into(),
            value: None,
            numeric_value: None,
            unit: None,
            source_page: None,
            source_text: None,
            confidence: 0.0,
            explanation: None,
            extraction_method: method,
            timestamp: Utc::now(),
        }
    }

    /// Create a zero-confidence result explaining why nothing was found.
    pub fn not_found(
        indicator_code: impl Into<String>,
        method: ExtractionMethod,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(indicator_code, method).with_explanation(reason)
    }

    /// Confidence in `[0, 1]`.
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Set the confidence, clamping into `[0, 1]`.
    pub fn set_confidence(&mut self, confidence: f64) {
        self.confidence = clamp_confidence(confidence);
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.set_confidence(confidence);
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_numeric_value(mut self, numeric: f64) -> Self {
        self.numeric_value = Some(numeric);
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_source_page(mut self, page: usize) -> Self {
        self.source_page = Some(page);
        self
    }

    pub fn with_source_text(mut self, text: impl Into<String>) -> Self {
        self.source_text = Some(text.into());
        self
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    /// Whether a value was extracted.
    pub fn is_found(&self) -> bool {
        self.value.is_some()
    }

    /// Tagged view of this result.
    pub fn outcome(&self) -> Outcome {
        match &self.value {
            Some(value) => Outcome::Found {
                value: value.clone(),
                confidence: self.confidence,
            },
            None => Outcome::NotFound {
                reason: self
                    .explanation
                    .clone()
                    .unwrap_or_else(|| "not found".to_string()),
            },
        }
    }
}

/// Whether an indicator value was found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Found { value: String, confidence: f64 },
    NotFound { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_not_found_has_zero_confidence() {
        let result =
            ExtractionResult::not_found("E1-1", ExtractionMethod::Agent, "Max iterations reached");
        assert_eq!(result.confidence(), 0.0);
        assert_eq!(
            result.outcome(),
            Outcome::NotFound {
                reason: "Max iterations reached".into()
            }
        );
    }

    #[test]
    fn test_found_outcome() {
        let result = ExtractionResult::new("S1-1", ExtractionMethod::Simple)
            .with_value("12,500 FTE")
            .with_confidence(0.9);
        assert!(result.is_found());
        assert_eq!(
            result.outcome(),
            Outcome::Found {
                value: "12,500 FTE".into(),
                confidence: 0.9
            }
        );
    }

    #[test]
    fn test_nan_confidence_becomes_zero() {
        let result = ExtractionResult::new("E1-1", ExtractionMethod::Simple).with_confidence(f64::NAN);
        assert_eq!(result.confidence(), 0.0);
    }

    #[test]
    fn test_method_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(ExtractionMethod::VectorSearch).unwrap(),
            "vector_search"
        );
    }

    #[test]
    fn test_deserialize_clamps_confidence() {
        let json = serde_json::json!({
            "indicator_code": "G1-2",
            "value": "11",
            "numeric_value": 11.0,
            "unit": null,
            "source_page": 4,
            "source_text": null,
            "confidence": 7.5,
            "explanation": null,
            "extraction_method": "agent",
            "timestamp": "2024-05-01T00:00:00Z"
        });
        let result: ExtractionResult = serde_json::from_value(json).unwrap();
        assert_eq!(result.confidence(), 1.0);
    }

    proptest! {
        #[test]
        fn confidence_always_in_unit_interval(raw in proptest::num::f64::ANY) {
            let result = ExtractionResult::new("E1-1", ExtractionMethod::Agent).with_confidence(raw);
            prop_assert!((0.0..=1.0).contains(&result.confidence()));
        }
    }
}
