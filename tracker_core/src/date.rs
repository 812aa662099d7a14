//! Canonical calendar-date handling.
//!
//! Exercise dates are stored as the text the client sent. Every time a date
//! leaves the service, or takes part in a range filter, it is re-parsed here
//! and rendered in one fixed, locale-independent format such as
//! `"Mon Jan 01 2024"`. All instants are UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// Rendering used for defaulted dates and for every echoed date
pub const CANONICAL_FORMAT: &str = "%a %b %d %Y";

/// Rendering of a stored date that cannot be parsed
pub const INVALID_DATE: &str = "Invalid Date";

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    CANONICAL_FORMAT,
    "%b %d %Y",
    "%B %d %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Render an instant as a canonical date string
pub fn format_canonical(instant: DateTime<Utc>) -> String {
    instant.format(CANONICAL_FORMAT).to_string()
}

/// Parse a date leniently
///
/// Returns `None` for anything that is not a recognisable date.
/// Date-only inputs resolve to midnight UTC.
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let text = input.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(midnight(date));
        }
    }

    parse_partial_date(text)
}

/// `YYYY` and `YYYY-MM` resolve to the first day of the period
fn parse_partial_date(text: &str) -> Option<DateTime<Utc>> {
    let mut parts = text.splitn(2, '-');
    let year = parts.next()?;
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = year.parse().ok()?;

    let month = match parts.next() {
        None => 1,
        Some(m) if m.len() == 2 && m.bytes().all(|b| b.is_ascii_digit()) => m.parse().ok()?,
        Some(_) => return None,
    };

    NaiveDate::from_ymd_opt(year, month, 1).map(midnight)
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Re-render a stored date string canonically
pub fn render_stored(stored: &str) -> String {
    match parse_date(stored) {
        Some(instant) => format_canonical(instant),
        None => INVALID_DATE.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_format_canonical() {
        assert_eq!(format_canonical(utc(2024, 1, 1)), "Mon Jan 01 2024");
        assert_eq!(format_canonical(utc(2023, 6, 15)), "Thu Jun 15 2023");
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(parse_date("2023-01-01"), Some(utc(2023, 1, 1)));
        assert_eq!(parse_date(" 2023-12-31 "), Some(utc(2023, 12, 31)));
    }

    #[test]
    fn test_parse_canonical_roundtrips() {
        let rendered = format_canonical(utc(2022, 2, 28));
        assert_eq!(parse_date(&rendered), Some(utc(2022, 2, 28)));
    }

    #[test]
    fn test_parse_timestamps() {
        assert_eq!(
            parse_date("2023-06-15T10:30:00Z"),
            Some(Utc.with_ymd_and_hms(2023, 6, 15, 10, 30, 0).unwrap())
        );
        assert_eq!(
            parse_date("2023-06-15T10:30"),
            Some(Utc.with_ymd_and_hms(2023, 6, 15, 10, 30, 0).unwrap())
        );
        assert_eq!(
            parse_date("Thu, 15 Jun 2023 10:30:00 +0000"),
            Some(Utc.with_ymd_and_hms(2023, 6, 15, 10, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_other_forms() {
        assert_eq!(parse_date("2023/06/15"), Some(utc(2023, 6, 15)));
        assert_eq!(parse_date("06/15/2023"), Some(utc(2023, 6, 15)));
        assert_eq!(parse_date("June 15, 2023"), Some(utc(2023, 6, 15)));
        assert_eq!(parse_date("Jun 15 2023"), Some(utc(2023, 6, 15)));
        assert_eq!(parse_date("2023-06"), Some(utc(2023, 6, 1)));
        assert_eq!(parse_date("2023"), Some(utc(2023, 1, 1)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("2023-13-01"), None);
        assert_eq!(parse_date("2023-02-30"), None);
        assert_eq!(parse_date("123"), None);
    }

    #[test]
    fn test_render_stored() {
        assert_eq!(render_stored("2024-01-01"), "Mon Jan 01 2024");
        assert_eq!(render_stored("not a date"), INVALID_DATE);
    }
}
