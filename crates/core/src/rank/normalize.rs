use once_cell::sync::Lazy;
use regex::Regex;

static FIRST_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("number pattern must compile"));

/// Reads the first signed decimal number out of a locale formatted value.
///
/// Thousands separators are dropped before matching. Units are not interpreted, so
/// `"43,000만"` reads as `43000.0`.
pub fn parse_numeric(value: Option<&str>) -> Option<f64> {
    let s = value?.trim();
    if s.is_empty() {
        return None;
    }
    let s = s.replace(',', "");
    FIRST_NUMBER
        .find(&s)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

/// Reads a loosely typed JSON value as a number: JSON numbers as-is, strings only when the
/// whole trimmed string is a number.
pub fn loose_f64(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

pub fn clamp01(x: Option<f64>) -> f64 {
    match x {
        Some(x) if !x.is_nan() => x.clamp(0.0, 1.0),
        _ => 0.0,
    }
}

/// Rounds to two decimals, halves away from zero.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_separators_and_ignores_units() {
        assert_eq!(parse_numeric(Some("17,700")), Some(17700.0));
        assert_eq!(parse_numeric(Some("43,000만")), Some(43000.0));
        assert_eq!(parse_numeric(Some("  1,234.5 ")), Some(1234.5));
    }

    #[test]
    fn takes_first_signed_number() {
        assert_eq!(parse_numeric(Some("-12.5kg")), Some(-12.5));
        assert_eq!(parse_numeric(Some("보증금 500 / 월 45")), Some(500.0));
        assert_eq!(parse_numeric(Some("12.")), Some(12.0));
    }

    #[test]
    fn non_numeric_is_none() {
        assert_eq!(parse_numeric(None), None);
        assert_eq!(parse_numeric(Some("")), None);
        assert_eq!(parse_numeric(Some("   ")), None);
        assert_eq!(parse_numeric(Some("협의")), None);
    }

    #[test]
    fn loose_f64_accepts_numbers_and_numeric_strings() {
        assert_eq!(loose_f64(&json!(88.5)), Some(88.5));
        assert_eq!(loose_f64(&json!(" 72 ")), Some(72.0));
        assert_eq!(loose_f64(&json!("72점")), None);
        assert_eq!(loose_f64(&json!(null)), None);
        assert_eq!(loose_f64(&json!([1])), None);
    }

    #[test]
    fn clamp01_bounds() {
        assert_eq!(clamp01(None), 0.0);
        assert_eq!(clamp01(Some(1.5)), 1.0);
        assert_eq!(clamp01(Some(-0.2)), 0.0);
        assert_eq!(clamp01(Some(0.4)), 0.4);
        assert_eq!(clamp01(Some(f64::NAN)), 0.0);
    }

    #[test]
    fn round2_pins_values() {
        assert_eq!(round2(94.45), 94.45);
        assert_eq!(round2(49.53571428571428), 49.54);
        assert_eq!(round2(3.149255216469816), 3.15);
    }
}
