//! Validation and parsing of spreadsheet cells

use bigdecimal::BigDecimal;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::str::FromStr;

use crate::types::*;

/// Date layouts tried in order; day-first before anything ambiguous
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y", "%d.%m.%Y"];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M"];

/// Smallest serial read as a date (1927-05-18); below it a bare number is
/// more likely a year or an amount
const MIN_EXCEL_SERIAL: i64 = 10_000;

/// Largest serial Excel can represent (9999-12-31)
const MAX_EXCEL_SERIAL: i64 = 2_958_465;

/// Parse a monetary cell.
///
/// Accepts `1234.56`, `1,234.56`, `1.234,56`, `$ 1.234.567`, a leading minus
/// or parentheses for negatives. A lone comma followed by one or two digits
/// is read as the decimal separator, otherwise as a thousands separator.
/// A lone dot followed by exactly three digits (`150.000`) is a thousands
/// separator unless the integer part is zero (`0.500`).
pub fn parse_amount(raw: &str) -> CoreResult<BigDecimal> {
    let trimmed = raw.trim();
    let (negative, body) = match trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let cleaned: String = body
        .chars()
        .filter(|c| !matches!(c, '$' | ' ' | '\u{a0}'))
        .collect();
    let cleaned = cleaned.trim_start_matches("COP").trim_end_matches("COP");

    let normalized = normalize_separators(cleaned);
    if normalized.is_empty() || normalized == "-" {
        return Err(CoreError::Validation(format!("empty amount {raw:?}")));
    }

    let value = BigDecimal::from_str(&normalized)
        .map_err(|_| CoreError::Validation(format!("invalid amount {raw:?}")))?;

    Ok(if negative { -value } else { value })
}

fn normalize_separators(s: &str) -> String {
    let last_dot = s.rfind('.');
    let last_comma = s.rfind(',');

    match (last_dot, last_comma) {
        // both present: whichever comes last is the decimal separator
        (Some(dot), Some(comma)) if comma > dot => s.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => s.replace(',', ""),
        (None, Some(comma)) => {
            let decimals = s.len() - comma - 1;
            if s.matches(',').count() == 1 && (1..=2).contains(&decimals) {
                s.replace(',', ".")
            } else {
                s.replace(',', "")
            }
        }
        (Some(_), None) if s.matches('.').count() > 1 => s.replace('.', ""),
        (Some(dot), None) if is_thousands_group(&s[..dot], &s[dot + 1..]) => {
            s.replace('.', "")
        }
        _ => s.to_string(),
    }
}

/// `int.frac` reads as a thousands group: 1 to 3 leading digits, not zero,
/// followed by exactly three digits
fn is_thousands_group(int: &str, frac: &str) -> bool {
    let int = int.trim_start_matches('-');
    frac.len() == 3
        && frac.chars().all(|c| c.is_ascii_digit())
        && (1..=3).contains(&int.len())
        && int.chars().all(|c| c.is_ascii_digit())
        && !int.starts_with('0')
}

/// Parse a date cell in any of the supported layouts, including Excel
/// serial numbers and datetime strings
pub fn parse_date(raw: &str) -> CoreResult<NaiveDate> {
    let s = raw.trim();

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(datetime.date());
        }
    }

    if let Some(date) = excel_serial_to_date(s) {
        return Ok(date);
    }

    Err(CoreError::Validation(format!("invalid date {raw:?}")))
}

/// Excel stores dates as days since 1899-12-30
fn excel_serial_to_date(s: &str) -> Option<NaiveDate> {
    let whole = s.split_once('.').map_or(s, |(int, _)| int);
    let serial: i64 = whole.parse().ok()?;
    if !(MIN_EXCEL_SERIAL..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(Duration::days(serial))
}

/// Parse an amount, falling back to zero.
///
/// Returns the parse error message alongside the zero so callers can flag
/// the row instead of dropping it.
pub fn coerce_amount(raw: &str) -> (BigDecimal, Option<String>) {
    match parse_amount(raw) {
        Ok(value) => (value, None),
        Err(e) => (BigDecimal::from(0), Some(e.to_string())),
    }
}

/// Validate that a column name is usable in a mapping
pub fn validate_column_name(name: &str) -> CoreResult<()> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation(
            "Column name cannot be empty".to_string(),
        ));
    }

    if name.len() > 100 {
        return Err(CoreError::Validation(
            "Column name cannot exceed 100 characters".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_plain_amounts() {
        assert_eq!(parse_amount("1234.56").unwrap(), dec("1234.56"));
        assert_eq!(parse_amount("  -500 ").unwrap(), dec("-500"));
        assert_eq!(parse_amount("0").unwrap(), dec("0"));
    }

    #[test]
    fn test_parse_separators() {
        assert_eq!(parse_amount("1,234.56").unwrap(), dec("1234.56"));
        assert_eq!(parse_amount("1.234,56").unwrap(), dec("1234.56"));
        assert_eq!(parse_amount("1.234.567").unwrap(), dec("1234567"));
        assert_eq!(parse_amount("1,234,567").unwrap(), dec("1234567"));
        assert_eq!(parse_amount("1,234").unwrap(), dec("1234"));
        assert_eq!(parse_amount("1234,5").unwrap(), dec("1234.5"));
    }

    #[test]
    fn test_single_dot_thousands_group() {
        assert_eq!(parse_amount("$ 150.000").unwrap(), dec("150000"));
        assert_eq!(parse_amount("1.234").unwrap(), dec("1234"));
        assert_eq!(parse_amount("-45.000").unwrap(), dec("-45000"));
        // still decimals
        assert_eq!(parse_amount("0.500").unwrap(), dec("0.5"));
        assert_eq!(parse_amount("1234.567").unwrap(), dec("1234.567"));
        assert_eq!(parse_amount("12.50").unwrap(), dec("12.5"));
    }

    #[test]
    fn test_parse_currency_and_negatives() {
        assert_eq!(parse_amount("$ 1.500.000").unwrap(), dec("1500000"));
        assert_eq!(parse_amount("(45,000)").unwrap(), dec("-45000"));
        assert_eq!(parse_amount("COP 20000").unwrap(), dec("20000"));
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert!(parse_amount("").is_err());
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("$").is_err());
    }

    #[test]
    fn test_coerce_amount() {
        let (value, issue) = coerce_amount("1,000");
        assert_eq!(value, dec("1000"));
        assert!(issue.is_none());

        let (value, issue) = coerce_amount("n/a");
        assert_eq!(value, dec("0"));
        assert!(issue.unwrap().contains("invalid amount"));
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(parse_date("2024-01-05").unwrap(), expected);
        assert_eq!(parse_date("05/01/2024").unwrap(), expected);
        assert_eq!(parse_date("2024/01/05").unwrap(), expected);
        assert_eq!(parse_date("05-01-2024").unwrap(), expected);
        assert_eq!(parse_date("2024-01-05 00:00:00").unwrap(), expected);
    }

    #[test]
    fn test_parse_excel_serial() {
        assert_eq!(
            parse_date("45296").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
        assert_eq!(
            parse_date("45296.0").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
    }

    #[test]
    fn test_bare_year_is_not_a_serial() {
        assert!(parse_date("2024").is_err());
        assert!(parse_date("150").is_err());
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(parse_date("yesterday").is_err());
        assert!(parse_date("2024-13-40").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_validate_column_name() {
        assert!(validate_column_name("Fecha").is_ok());
        assert!(validate_column_name("  ").is_err());
        assert!(validate_column_name(&"x".repeat(101)).is_err());
    }
}
