//! Field normalization: raw statement cells into typed dates and amounts.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

static ISO_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").expect("valid ISO prefix regex"));

static NUMERIC_TRIPLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,4})[/-](\d{1,2})[/-](\d{1,4})$").expect("valid numeric date regex")
});

const TEXTUAL_FORMATS: &[&str] = &["%d %b %Y", "%d %B %Y", "%b %d, %Y", "%B %d, %Y", "%b %d %Y"];

const ISO_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Parse a statement date cell.
///
/// Unambiguous forms (ISO dates and timestamps, spelled-out months) are tried
/// first. A bare numeric triple `a/b/c` or `a-b-c` is then read as
/// month/day/year and, failing that, as year/month/day.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    parse_unambiguous(s).or_else(|| parse_numeric_triple(s))
}

fn parse_unambiguous(s: &str) -> Option<NaiveDate> {
    if ISO_PREFIX.is_match(s) {
        if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Some(d);
        }
        // Timestamps keep the calendar date as written, whatever the offset.
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.naive_local().date());
        }
        for fmt in ISO_DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(dt.date());
            }
        }
        return None;
    }

    TEXTUAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

fn parse_numeric_triple(s: &str) -> Option<NaiveDate> {
    let caps = NUMERIC_TRIPLE.captures(s)?;
    let a: u32 = caps[1].parse().ok()?;
    let b: u32 = caps[2].parse().ok()?;
    let c: u32 = caps[3].parse().ok()?;

    NaiveDate::from_ymd_opt(c as i32, a, b).or_else(|| NaiveDate::from_ymd_opt(a as i32, b, c))
}

/// Parse a statement amount cell.
///
/// Currency symbols, thousands separators and surrounding whitespace are
/// dropped; `(87.50)` is the accounting form of `-87.50`.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | '£' | '€' | ','))
        .collect();
    let cleaned = cleaned.trim();

    if let Some(inner) = cleaned.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        let value = parse_plain_decimal(inner.trim())?;
        return Some(-value.abs());
    }
    parse_plain_decimal(cleaned)
}

fn parse_plain_decimal(s: &str) -> Option<Decimal> {
    let s = s.strip_prefix('+').unwrap_or(s);
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    Decimal::from_str(s).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jan15() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn test_parse_amount_spec_cases() {
        assert_eq!(parse_amount("-$87.50"), Some(Decimal::new(-8750, 2)));
        assert_eq!(parse_amount("$87.50"), Some(Decimal::new(8750, 2)));
        assert_eq!(parse_amount("(87.50)"), Some(Decimal::new(-8750, 2)));
        assert_eq!(parse_amount("1,234.56"), Some(Decimal::new(123456, 2)));
        assert_eq!(parse_amount("-1,234.56"), Some(Decimal::new(-123456, 2)));
    }

    #[test]
    fn test_parse_amount_other_symbols_and_whitespace() {
        assert_eq!(parse_amount("  £12.00 "), Some(Decimal::new(1200, 2)));
        assert_eq!(parse_amount("€ 3"), Some(Decimal::new(3, 0)));
        assert_eq!(parse_amount("$-5.25"), Some(Decimal::new(-525, 2)));
        assert_eq!(parse_amount("($1,000.00)"), Some(Decimal::new(-100000, 2)));
        assert_eq!(parse_amount("+42"), Some(Decimal::new(42, 0)));
    }

    #[test]
    fn test_parse_amount_rejects_residue() {
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("12.5 USD"), None);
        assert_eq!(parse_amount("$"), None);
        assert_eq!(parse_amount("1.2.3"), None);
        assert_eq!(parse_amount("1e5"), None);
        assert_eq!(parse_amount("()"), None);
    }

    #[test]
    fn test_parse_date_equivalent_forms() {
        assert_eq!(parse_date("2024-01-15"), Some(jan15()));
        assert_eq!(parse_date("01/15/2024"), Some(jan15()));
        assert_eq!(parse_date("01-15-2024"), Some(jan15()));
        assert_eq!(parse_date("2024/01/15"), Some(jan15()));
        assert_eq!(parse_date(" 1/15/2024 "), Some(jan15()));
    }

    #[test]
    fn test_parse_date_timestamps_keep_written_date() {
        assert_eq!(parse_date("2024-01-15T23:30:00-08:00"), Some(jan15()));
        assert_eq!(parse_date("2024-01-15 08:00:00"), Some(jan15()));
    }

    #[test]
    fn test_parse_date_textual_months() {
        assert_eq!(parse_date("15 Jan 2024"), Some(jan15()));
        assert_eq!(parse_date("Jan 15, 2024"), Some(jan15()));
        assert_eq!(parse_date("January 15, 2024"), Some(jan15()));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date("invalid-date"), None);
        assert_eq!(parse_date("13/45/2024"), None);
        assert_eq!(parse_date("02/30/2024"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_ambiguous_triple_prefers_month_first() {
        // 03/04/05 is a valid month/day/year triple, so year-first is never tried.
        assert_eq!(parse_date("03/04/05"), NaiveDate::from_ymd_opt(5, 3, 4));
    }
}
