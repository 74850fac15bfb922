//! Numeric value parsing for report figures.
//!
//! Reports mix conventions: `1,234,567`, `1.234.567`, `1 234 567`, `12,5 %`,
//! `€1,234.56`. Parsing never panics; anything that does not reduce to a
//! plain decimal number yields `None`.

use std::sync::LazyLock;

use regex::Regex;

static PLAIN_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(\d+(\.\d+)?|\.\d+)$").unwrap());

static COMMA_THOUSANDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d{1,3}(,\d{3})+$").unwrap());

static NUMBER_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[€$£¥]?\s?-?(?:\d{1,3}(?:[ \x{A0}\x{202F}]\d{3})+(?:[.,]\d+)?|\d(?:[\d.,]*\d)?)\s?%?",
    )
    .unwrap()
});

/// Parse a figure as written in a report.
///
/// - currency symbols (€ $ £ ¥) and whitespace are dropped
/// - `%` marks a percentage; values above 1 are divided by 100
/// - with both `,` and `.`, the later one is the decimal separator
/// - commas only: thousands separators when every group after the first
///   has exactly three digits, otherwise a decimal comma
/// - dots only: several dots are thousands separators, one dot is decimal
pub fn parse_numeric(text: &str) -> Option<f64> {
    let is_percentage = text.contains('%');
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '€' | '$' | '£' | '¥' | '%') && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) if dot > comma => cleaned.replace(',', ""),
        (Some(_), Some(_)) => cleaned.replace('.', "").replace(',', "."),
        (Some(_), None) if COMMA_THOUSANDS.is_match(&cleaned) => cleaned.replace(',', ""),
        (Some(_), None) => cleaned.replace(',', "."),
        (None, Some(_)) if cleaned.matches('.').count() > 1 => cleaned.replace('.', ""),
        _ => cleaned,
    };

    if !PLAIN_NUMBER.is_match(&normalized) {
        return None;
    }

    let value: f64 = normalized.parse().ok()?;
    if !value.is_finite() {
        return None;
    }

    Some(if is_percentage && value > 1.0 {
        value / 100.0
    } else {
        value
    })
}

/// Find and parse the first number-like token in free text.
///
/// `"about 12.5% of staff"` yields `0.125`; text without digits yields `None`.
pub fn find_numeric(text: &str) -> Option<f64> {
    NUMBER_TOKEN
        .find_iter(text)
        .find_map(|m| parse_numeric(m.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_thousands_separators() {
        assert_eq!(parse_numeric("1,234,567"), Some(1234567.0));
        assert_eq!(parse_numeric("1.234.567"), Some(1234567.0));
        assert_eq!(parse_numeric("1 234 567"), Some(1234567.0));
    }

    #[test]
    fn test_mixed_separators() {
        assert_eq!(parse_numeric("€1,234.56"), Some(1234.56));
        assert_eq!(parse_numeric("1.234,56 €"), Some(1234.56));
    }

    #[test]
    fn test_decimal_comma() {
        assert_eq!(parse_numeric("12,5"), Some(12.5));
        assert_eq!(parse_numeric("1,234"), Some(1234.0));
    }

    #[test]
    fn test_percentages() {
        assert_eq!(parse_numeric("12.5%"), Some(0.125));
        assert_eq!(parse_numeric("0.5%"), Some(0.5));
        assert_eq!(parse_numeric("42 %"), Some(0.42));
    }

    #[test]
    fn test_malformed_is_none() {
        assert_eq!(parse_numeric(""), None);
        assert_eq!(parse_numeric("   "), None);
        assert_eq!(parse_numeric("n/a"), None);
        assert_eq!(parse_numeric("inf"), None);
        assert_eq!(parse_numeric("NaN"), None);
        assert_eq!(parse_numeric("12 tCO2e"), None);
        assert_eq!(parse_numeric("1,2,3"), None);
    }

    #[test]
    fn test_negative() {
        assert_eq!(parse_numeric("-3.5"), Some(-3.5));
    }

    #[test]
    fn test_find_numeric_in_text() {
        assert_eq!(find_numeric("1,234,567 tCO2e"), Some(1234567.0));
        assert_eq!(find_numeric("about 12.5% of staff"), Some(0.125));
        assert_eq!(find_numeric("Scope 1 emissions of 45 000 tCO2e"), Some(1.0));
        assert_eq!(find_numeric("no figures here"), None);
    }

    #[test]
    fn test_find_numeric_space_grouped() {
        assert_eq!(find_numeric("emissions were 45 000 tCO2e"), Some(45000.0));
    }

    proptest! {
        #[test]
        fn parse_never_panics(s in "\\PC*") {
            let _ = parse_numeric(&s);
            let _ = find_numeric(&s);
        }

        #[test]
        fn parses_plain_integers(n in 0u32..1_000_000) {
            prop_assert_eq!(parse_numeric(&n.to_string()), Some(n as f64));
        }
    }
}
