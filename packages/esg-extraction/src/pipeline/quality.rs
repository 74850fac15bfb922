//! Quality scoring and the plain-text run report.

use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::types::config::ExtractionConfig;
use crate::types::indicator::code_prefix;
use crate::types::result::ExtractionResult;

/// Weight of coverage in the quality score.
pub const COVERAGE_WEIGHT: f64 = 0.6;

/// Weight of average confidence in the quality score.
pub const CONFIDENCE_WEIGHT: f64 = 0.4;

/// Aggregate metrics for one batch of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub total: usize,
    /// Results with confidence above the found threshold
    pub found: usize,
    pub not_found: usize,
    /// `found / total`, 0 for an empty batch
    pub coverage: f64,
    /// Mean confidence over results with confidence > 0
    pub avg_confidence: f64,
    pub quality_score: f64,
}

/// Score a batch of results.
///
/// Zero-confidence results count against coverage but are left out of the
/// confidence average.
pub fn quality(results: &[ExtractionResult], found_threshold: f64) -> QualityMetrics {
    let total = results.len();
    let found = results
        .iter()
        .filter(|r| r.confidence() > found_threshold)
        .count();

    let coverage = if total > 0 {
        found as f64 / total as f64
    } else {
        0.0
    };

    let confident: Vec<f64> = results
        .iter()
        .map(ExtractionResult::confidence)
        .filter(|c| *c > 0.0)
        .collect();
    let avg_confidence = if confident.is_empty() {
        0.0
    } else {
        confident.iter().sum::<f64>() / confident.len() as f64
    };

    QualityMetrics {
        total,
        found,
        not_found: total - found,
        coverage,
        avg_confidence,
        quality_score: COVERAGE_WEIGHT * coverage + CONFIDENCE_WEIGHT * avg_confidence,
    }
}

/// Render a plain-text report for a company and reporting year.
pub fn render_report(
    company: &str,
    year: i32,
    results: &[ExtractionResult],
    config: &ExtractionConfig,
) -> String {
    let metrics = quality(results, config.quality_found_threshold);
    let rule = "=".repeat(80);
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "ESG DATA EXTRACTION REPORT");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Company: {company}");
    let _ = writeln!(out, "Report Year: {year}");
    let _ = writeln!(out, "Extraction Date: {}", Utc::now().format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out);

    let _ = writeln!(out, "QUALITY METRICS");
    let _ = writeln!(out, "{}", "-".repeat(80));
    let _ = writeln!(out, "Total Indicators: {}", metrics.total);
    let _ = writeln!(out, "Successfully Extracted: {}", metrics.found);
    let _ = writeln!(out, "Not Found: {}", metrics.not_found);
    let _ = writeln!(out, "Coverage: {:.1}%", metrics.coverage * 100.0);
    let _ = writeln!(out, "Average Confidence: {:.2}", metrics.avg_confidence);
    let _ = writeln!(out, "Overall Quality Score: {:.2}", metrics.quality_score);
    let _ = writeln!(out);

    let _ = writeln!(out, "DETAILED RESULTS");
    let _ = writeln!(out, "{}", "-".repeat(80));

    let mut by_prefix: BTreeMap<&str, Vec<&ExtractionResult>> = BTreeMap::new();
    for result in results {
        by_prefix
            .entry(code_prefix(&result.indicator_code))
            .or_default()
            .push(result);
    }

    for (prefix, group) in by_prefix {
        let _ = writeln!(out, "\n{prefix} Indicators:");
        let _ = writeln!(out, "{}", "-".repeat(40));
        for result in group {
            let mark = if result.confidence() > config.validated_threshold {
                '✓'
            } else {
                '✗'
            };
            let _ = writeln!(
                out,
                "{} {}: {} ({:.2})",
                mark,
                result.indicator_code,
                result.value.as_deref().unwrap_or("Not found"),
                result.confidence()
            );
        }
    }

    let _ = writeln!(out, "\n{rule}");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::result::ExtractionMethod;

    fn result(code: &str, value: Option<&str>, confidence: f64) -> ExtractionResult {
        let mut result =
            ExtractionResult::new(code, ExtractionMethod::Simple).with_confidence(confidence);
        result.value = value.map(String::from);
        result
    }

    #[test]
    fn test_quality_excludes_zero_confidence_from_average() {
        let metrics = quality(&[result("E1-1", Some("x"), 0.9), result("E1-2", None, 0.0)], 0.3);
        assert_eq!(metrics.total, 2);
        assert_eq!(metrics.found, 1);
        assert_eq!(metrics.not_found, 1);
        assert!((metrics.coverage - 0.5).abs() < 1e-9);
        assert!((metrics.avg_confidence - 0.9).abs() < 1e-9);
        assert!((metrics.quality_score - 0.66).abs() < 1e-9);
    }

    #[test]
    fn test_quality_empty() {
        let metrics = quality(&[], 0.3);
        assert_eq!(metrics.total, 0);
        assert_eq!(metrics.coverage, 0.0);
        assert_eq!(metrics.avg_confidence, 0.0);
        assert_eq!(metrics.quality_score, 0.0);
    }

    #[test]
    fn test_found_threshold_is_strict() {
        let metrics = quality(&[result("S1-1", Some("x"), 0.3)], 0.3);
        assert_eq!(metrics.found, 0);
        assert!((metrics.avg_confidence - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_render_report_groups_by_prefix() {
        let results = vec![
            result("S1-1", Some("12,500 FTE"), 0.9),
            result("E1-1", Some("1,234 tCO2e"), 0.4),
            result("E1-2", None, 0.0),
        ];
        let report = render_report("Acme", 2024, &results, &ExtractionConfig::default());

        assert!(report.starts_with(&"=".repeat(80)));
        assert!(report.contains("Company: Acme"));
        assert!(report.contains("Report Year: 2024"));
        assert!(report.contains("Coverage: 66.7%"));
        assert!(report.contains("✓ S1-1: 12,500 FTE (0.90)"));
        assert!(report.contains("✗ E1-1: 1,234 tCO2e (0.40)"));
        assert!(report.contains("✗ E1-2: Not found (0.00)"));

        let e = report.find("E1 Indicators:").unwrap();
        let s = report.find("S1 Indicators:").unwrap();
        assert!(e < s);
    }
}
