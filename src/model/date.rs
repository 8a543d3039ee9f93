//! Best-effort normalization of ERP date encodings.
//!
//! Document dates show up as ISO strings with or without a time component,
//! digit-packed `YYYYMMDD` strings, packed integers, or epoch milliseconds.
//! Like the amount resolver, this is total: anything unrecognizable is
//! simply no date.

use chrono::{DateTime, NaiveDate};
use serde_json::Value;

/// Values above this are epoch milliseconds rather than packed dates.
const EPOCH_MILLIS_FLOOR: i64 = 1_000_000_000_000;
/// Packed `YYYYMMDD` integers start above this.
const PACKED_DATE_FLOOR: i64 = 100_000;

/// Normalizes a raw date value to a calendar date, if possible.
pub fn normalize_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(text) => from_text(text),
        Value::Number(number) => from_number(number.as_i64()?),
        _ => None,
    }
}

fn from_text(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    // ISO prefix covers both "2025-03-01" and "2025-03-01T00:00:00".
    if let Some(prefix) = trimmed.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return Some(date);
        }
    }

    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 8 {
        return NaiveDate::parse_from_str(&digits, "%Y%m%d").ok();
    }
    None
}

fn from_number(value: i64) -> Option<NaiveDate> {
    if value > EPOCH_MILLIS_FLOOR {
        return Some(DateTime::from_timestamp_millis(value)?.date_naive());
    }
    if value > PACKED_DATE_FLOOR {
        let year = value / 10_000;
        let month = (value % 10_000) / 100;
        let day = value % 100;
        return NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_iso_date() {
        assert_eq!(normalize_date(&json!("2025-03-01")), Some(date(2025, 3, 1)));
    }

    #[test]
    fn test_iso_datetime_prefix() {
        assert_eq!(
            normalize_date(&json!("2025-03-01T14:25:00")),
            Some(date(2025, 3, 1))
        );
    }

    #[test]
    fn test_packed_digit_string() {
        assert_eq!(normalize_date(&json!("20250301")), Some(date(2025, 3, 1)));
        assert_eq!(normalize_date(&json!("2025/03/01")), Some(date(2025, 3, 1)));
    }

    #[test]
    fn test_packed_integer() {
        assert_eq!(normalize_date(&json!(20250301)), Some(date(2025, 3, 1)));
    }

    #[test]
    fn test_epoch_milliseconds() {
        // 2025-03-01T00:00:00Z
        assert_eq!(
            normalize_date(&json!(1740787200000i64)),
            Some(date(2025, 3, 1))
        );
    }

    #[test]
    fn test_invalid_calendar_values() {
        assert_eq!(normalize_date(&json!(20251399)), None);
        assert_eq!(normalize_date(&json!("01.03.2025")), None);
    }

    #[test]
    fn test_unrecognizable_values() {
        assert_eq!(normalize_date(&json!("")), None);
        assert_eq!(normalize_date(&json!("yakinda")), None);
        assert_eq!(normalize_date(&json!(42)), None);
        assert_eq!(normalize_date(&json!(null)), None);
        assert_eq!(normalize_date(&json!({"tarih": "2025-03-01"})), None);
    }
}
