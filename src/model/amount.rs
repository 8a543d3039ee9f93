//! Amount normalization for raw ERP values.
//!
//! Orka payloads carry monetary amounts with no declared schema: plain
//! numbers, integers pre-scaled to minor units, and locale-formatted strings
//! such as `"1.234,56"`. This module turns one such raw value into a
//! canonical `Decimal`, or nothing.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Integer amounts whose absolute magnitude exceeds this are assumed to be
/// minor-unit encodings (hundredths) and are scaled down by 100. This mirrors
/// an observed upstream convention, not a documented contract, and will
/// misread a genuinely large major-unit integer.
const MINOR_UNITS_THRESHOLD: u64 = 10_000;

const NON_BREAKING_SPACE: char = '\u{00A0}';

/// Normalizes one raw value into a decimal amount.
///
/// Returns `None` (distinct from zero) when the value is null, a non-scalar
/// type, a non-finite number, or a string that does not parse as a number
/// after locale normalization.
pub fn resolve_amount(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => from_number(number),
        Value::String(text) => from_text(text),
        _ => None,
    }
}

fn from_number(number: &serde_json::Number) -> Option<Decimal> {
    if let Some(int) = number.as_i64() {
        let amount = Decimal::from(int);
        if int.unsigned_abs() > MINOR_UNITS_THRESHOLD {
            return Some((amount / Decimal::ONE_HUNDRED).round_dp(2));
        }
        return Some(amount);
    }

    let float = number.as_f64()?;
    if !float.is_finite() {
        return None;
    }
    if float.fract() == 0.0 && float.abs() > MINOR_UNITS_THRESHOLD as f64 {
        let amount = Decimal::from_f64(float)?;
        return Some((amount / Decimal::ONE_HUNDRED).round_dp(2));
    }
    Decimal::from_f64(float)
}

fn from_text(text: &str) -> Option<Decimal> {
    // `str::trim` strips all Unicode whitespace, U+00A0 included.
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let compact = trimmed.replace(NON_BREAKING_SPACE, "");

    let has_comma = compact.contains(',');
    let has_dot = compact.contains('.');
    let normalized = if has_comma && has_dot {
        // "1.234,56": dot groups thousands, comma is the decimal mark.
        compact.replace('.', "").replace(',', ".")
    } else if has_comma {
        compact.replace(',', ".")
    } else {
        compact
    };

    Decimal::from_str(&normalized)
        .ok()
        .or_else(|| Decimal::from_scientific(&normalized).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_null_is_no_value() {
        assert_eq!(resolve_amount(&Value::Null), None);
    }

    #[test]
    fn test_non_scalar_is_no_value() {
        assert_eq!(resolve_amount(&json!([100])), None);
        assert_eq!(resolve_amount(&json!({"tutar": 100})), None);
        assert_eq!(resolve_amount(&json!(true)), None);
    }

    #[test]
    fn test_empty_and_blank_strings() {
        assert_eq!(resolve_amount(&json!("")), None);
        assert_eq!(resolve_amount(&json!("   ")), None);
        assert_eq!(resolve_amount(&json!("\u{00A0}\u{00A0}")), None);
    }

    #[test]
    fn test_large_integer_is_minor_units() {
        assert_eq!(resolve_amount(&json!(150000)), Some(dec("1500.00")));
        assert_eq!(resolve_amount(&json!(-150000)), Some(dec("-1500.00")));
    }

    #[test]
    fn test_small_integer_is_taken_as_is() {
        assert_eq!(resolve_amount(&json!(42)), Some(dec("42")));
        assert_eq!(resolve_amount(&json!(-42)), Some(dec("-42")));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        assert_eq!(resolve_amount(&json!(10000)), Some(dec("10000")));
        assert_eq!(resolve_amount(&json!(10001)), Some(dec("100.01")));
    }

    #[test]
    fn test_whole_float_above_threshold_is_minor_units() {
        // The backend does not distinguish 150000 from 150000.0.
        assert_eq!(resolve_amount(&json!(150000.0)), Some(dec("1500.00")));
    }

    #[test]
    fn test_fractional_number_is_taken_as_is() {
        assert_eq!(resolve_amount(&json!(123.45)), Some(dec("123.45")));
        assert_eq!(resolve_amount(&json!(150000.5)), Some(dec("150000.5")));
    }

    #[test]
    fn test_european_thousands_and_decimal() {
        assert_eq!(resolve_amount(&json!("1.234,56")), Some(dec("1234.56")));
        assert_eq!(
            resolve_amount(&json!("12.345.678,90")),
            Some(dec("12345678.90"))
        );
    }

    #[test]
    fn test_comma_only_is_decimal_mark() {
        assert_eq!(resolve_amount(&json!("1234,56")), Some(dec("1234.56")));
    }

    #[test]
    fn test_dot_only_is_unchanged() {
        assert_eq!(resolve_amount(&json!("1234.56")), Some(dec("1234.56")));
    }

    #[test]
    fn test_plain_integer_string() {
        assert_eq!(resolve_amount(&json!("500")), Some(dec("500")));
        assert_eq!(resolve_amount(&json!("-500")), Some(dec("-500")));
    }

    #[test]
    fn test_internal_non_breaking_spaces_are_stripped() {
        assert_eq!(
            resolve_amount(&json!("1\u{00A0}234,56")),
            Some(dec("1234.56"))
        );
    }

    #[test]
    fn test_garbage_string_is_no_value() {
        assert_eq!(resolve_amount(&json!("abc")), None);
        assert_eq!(resolve_amount(&json!("12a34")), None);
        assert_eq!(resolve_amount(&json!("1.2.3")), None);
    }

    #[test]
    fn test_string_amounts_are_not_scaled() {
        // Only numeric integers trigger the minor-units heuristic.
        assert_eq!(resolve_amount(&json!("150000")), Some(dec("150000")));
    }

    #[test]
    fn test_reparse_is_idempotent() {
        for s in ["1.234,56", "1234,56", "1234.56", "-42", "0.01"] {
            let first = resolve_amount(&json!(s)).unwrap();
            let again = resolve_amount(&json!(first.to_string())).unwrap();
            assert_eq!(first, again, "re-parsing {s} drifted");
        }
    }
}
