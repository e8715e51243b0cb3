//! Date helper functions

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone};

/// Date-time layouts accepted in front-matter, tried in order
const DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Date-only layouts, interpreted as local midnight
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%b %d, %Y"];

/// Parse a loosely formatted date string.
///
/// Accepts RFC 3339 / RFC 2822, ISO-like date-times with or without an offset,
/// and plain dates. Values without an offset are read as local time.
///
/// # Examples
/// ```ignore
/// parse_date("2024-01-15")                // -> local midnight
/// parse_date("2024-01-15T10:30:00+08:00") // -> 02:30 UTC
/// ```
pub fn parse_date(s: &str) -> Option<DateTime<Local>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local));
    }
    if let Ok(dt) = DateTime::<FixedOffset>::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Local));
    }
    if let Ok(dt) = DateTime::<FixedOffset>::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f %z") {
        return Some(dt.with_timezone(&Local));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Local));
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return local_from_naive(naive);
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(day) = NaiveDate::parse_from_str(s, fmt) {
            return local_from_naive(day.and_hms_opt(0, 0, 0)?);
        }
    }

    None
}

fn local_from_naive(naive: NaiveDateTime) -> Option<DateTime<Local>> {
    Local.from_local_datetime(&naive).earliest()
}

/// Format a date as "January 5, 2024"
pub fn long_date<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%B %-d, %Y").to_string()
}

/// Format a raw date string as a long date, or return it unchanged when it
/// cannot be parsed
pub fn display_date(raw: &str) -> String {
    parse_date(raw)
        .map(|d| long_date(&d))
        .unwrap_or_else(|| raw.to_string())
}

/// Today's date as `YYYY-MM-DD`
pub fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// The current time as an RFC 3339 string
pub fn now_rfc3339() -> String {
    Local::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike, Utc};

    #[test]
    fn test_parse_plain_date() {
        let dt = parse_date("2024-01-15").unwrap();
        assert_eq!(dt.format("%Y-%m-%d").to_string(), "2024-01-15");
        assert_eq!(dt.hour(), 0);

        let dt = parse_date("2024/03/09").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 3, 9));
    }

    #[test]
    fn test_parse_datetime_forms() {
        let dt = parse_date("2024-01-15 10:30:00").unwrap();
        assert_eq!(dt.format("%H:%M").to_string(), "10:30");

        let dt = parse_date("2024-01-15T10:30").unwrap();
        assert_eq!(dt.format("%H:%M").to_string(), "10:30");
    }

    #[test]
    fn test_parse_with_offset() {
        let dt = parse_date("2024-01-15T10:30:00+08:00").unwrap();
        let utc = dt.with_timezone(&Utc);
        assert_eq!(utc.format("%Y-%m-%d %H:%M").to_string(), "2024-01-15 02:30");

        let dt = parse_date("2025-09-16T08:00:00.000Z").unwrap();
        assert_eq!(dt.with_timezone(&Utc).hour(), 8);
    }

    #[test]
    fn test_parse_long_form() {
        let dt = parse_date("January 5, 2024").unwrap();
        assert_eq!(dt.format("%Y-%m-%d").to_string(), "2024-01-05");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_date("").is_none());
        assert!(parse_date("not a date").is_none());
        assert!(parse_date("2024-13-45").is_none());
    }

    #[test]
    fn test_long_date() {
        let date = Local.with_ymd_and_hms(2024, 1, 5, 10, 30, 0).unwrap();
        assert_eq!(long_date(&date), "January 5, 2024");
    }

    #[test]
    fn test_display_date() {
        assert_eq!(display_date("2025-09-16"), "September 16, 2025");
        assert_eq!(display_date("someday"), "someday");
    }

    #[test]
    fn test_today_format() {
        let day = today();
        assert_eq!(day.len(), 10);
        assert!(NaiveDate::parse_from_str(&day, "%Y-%m-%d").is_ok());
    }
}
