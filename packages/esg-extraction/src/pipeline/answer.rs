//! Lenient decoding of JSON answers from models.
//!
//! Models return numbers as strings, booleans as `"true"`, and omit fields
//! freely. [`ModelAnswer::from_value`] accepts all of those instead of
//! rejecting the whole answer.

use serde_json::Value;

use crate::numeric::{find_numeric, parse_numeric};
use crate::types::result::{ExtractionMethod, ExtractionResult};

/// A structured answer as decoded from a model reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelAnswer {
    pub value: Option<String>,
    pub numeric_value: Option<f64>,
    pub unit: Option<String>,
    /// Raw confidence as given (not clamped)
    pub confidence: Option<f64>,
    pub explanation: Option<String>,
    pub source_text: Option<String>,
    pub source_page: Option<usize>,
    pub found: bool,
}

impl ModelAnswer {
    /// Decode an answer object. Non-objects decode as an empty, not-found answer.
    ///
    /// `found` defaults to whether a value is present when the field is absent.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        let text = |key: &str| obj.get(key).and_then(as_text);
        let value_text = text("value");

        let found = match obj.get("found") {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
            _ => value_text.is_some(),
        };

        Self {
            numeric_value: obj.get("numeric_value").and_then(as_number),
            unit: text("unit"),
            confidence: obj.get("confidence").and_then(as_number),
            explanation: text("explanation"),
            source_text: text("source_text"),
            source_page: obj.get("source_page").and_then(as_page),
            value: value_text,
            found,
        }
    }

    /// Confidence or zero.
    pub fn confidence_or_zero(&self) -> f64 {
        self.confidence.filter(|c| !c.is_nan()).unwrap_or(0.0)
    }

    /// Build a found result, deriving the numeric value from `value` when the
    /// model did not give one.
    pub fn into_result(
        self,
        code: &str,
        method: ExtractionMethod,
        default_confidence: f64,
    ) -> ExtractionResult {
        let mut result = ExtractionResult::new(code, method)
            .with_confidence(self.confidence.unwrap_or(default_confidence));
        result.numeric_value = self
            .numeric_value
            .or_else(|| self.value.as_deref().and_then(find_numeric));
        result.value = self.value;
        result.unit = self.unit;
        result.source_page = self.source_page;
        result.source_text = self.source_text;
        result.explanation = self.explanation;
        result
    }
}

/// Remove surrounding markdown code fences from a reply.
pub fn strip_code_fences(reply: &str) -> &str {
    reply
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Parse a reply as a JSON document after stripping code fences.
pub fn parse_json_reply(reply: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(strip_code_fences(reply))
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_numeric(s),
        _ => None,
    }
}

fn as_page(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 1.0).map(|f| f as u64))
            .and_then(|p| usize::try_from(p).ok())
            .filter(|p| *p >= 1),
        Value::String(s) => s.trim().parse::<usize>().ok().filter(|p| *p >= 1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_json_reply_fenced() {
        let value = parse_json_reply("```json\n{\"found\": false}\n```").unwrap();
        assert_eq!(value["found"], json!(false));
        assert!(parse_json_reply("not json").is_err());
    }

    #[test]
    fn test_full_answer() {
        let answer = ModelAnswer::from_value(&json!({
            "value": "1,234 tCO2e",
            "numeric_value": 1234,
            "unit": "tCO2e",
            "confidence": 0.95,
            "explanation": "Found in emissions table on page 77",
            "source_page": 77,
            "found": true
        }));
        assert!(answer.found);
        assert_eq!(answer.value.as_deref(), Some("1,234 tCO2e"));
        assert_eq!(answer.numeric_value, Some(1234.0));
        assert_eq!(answer.source_page, Some(77));
        assert_eq!(answer.confidence, Some(0.95));
    }

    #[test]
    fn test_stringly_typed_fields() {
        let answer = ModelAnswer::from_value(&json!({
            "value": 42,
            "numeric_value": "1.234.567",
            "confidence": "0.7",
            "source_page": "12",
            "found": "true"
        }));
        assert!(answer.found);
        assert_eq!(answer.value.as_deref(), Some("42"));
        assert_eq!(answer.numeric_value, Some(1_234_567.0));
        assert_eq!(answer.confidence, Some(0.7));
        assert_eq!(answer.source_page, Some(12));
    }

    #[test]
    fn test_found_defaults_to_value_presence() {
        assert!(ModelAnswer::from_value(&json!({"value": "12%"})).found);
        assert!(!ModelAnswer::from_value(&json!({"value": null})).found);
        assert!(!ModelAnswer::from_value(&json!("text")).found);
    }

    #[test]
    fn test_into_result_defaults() {
        let result = ModelAnswer::from_value(&json!({"value": "about 12,500 employees", "found": true}))
            .into_result("S1-1", ExtractionMethod::Agent, 0.5);
        assert_eq!(result.confidence(), 0.5);
        assert_eq!(result.numeric_value, Some(12_500.0));
    }

    #[test]
    fn test_into_result_clamps() {
        let result = ModelAnswer::from_value(&json!({"value": "x", "confidence": 7}))
            .into_result("S1-1", ExtractionMethod::Simple, 0.0);
        assert_eq!(result.confidence(), 1.0);
    }
}
