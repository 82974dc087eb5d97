//! Shared parsing utilities for collision timestamps.
//!
//! Collision exports split the timestamp into a date and a time-of-day
//! column, in either UK (`dd/mm/yyyy`) or ISO form.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%Y-%m-%d"];

const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S", "%H:%M:%S%.f"];

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
];

/// Parses a collision date. Returns `None` if empty or unparseable.
#[must_use]
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Parses a full timestamp. Returns `None` if it is not one.
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Date component of a full timestamp.
#[must_use]
pub fn parse_timestamp_date(s: &str) -> Option<NaiveDate> {
    parse_timestamp(s).map(|dt| dt.date())
}

/// Extracts the hour of day from a time-of-day or a full timestamp.
#[must_use]
pub fn parse_hour(s: &str) -> Option<u8> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
        .or_else(|| parse_timestamp(s).map(|dt| dt.time()))
        .and_then(|t| u8::try_from(t.hour()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_uk_and_iso_dates() {
        let expected = NaiveDate::from_ymd_opt(2023, 3, 14).unwrap();
        assert_eq!(parse_date("14/03/2023"), Some(expected));
        assert_eq!(parse_date("2023-03-14"), Some(expected));
        assert_eq!(parse_date(" 2023-03-14 "), Some(expected));
    }

    #[test]
    fn rejects_invalid_date() {
        assert!(parse_date("not-a-date").is_none());
        assert!(parse_date("31/02/2023").is_none());
        assert!(parse_date("").is_none());
    }

    #[test]
    fn parses_hour_from_time_of_day() {
        assert_eq!(parse_hour("00:05"), Some(0));
        assert_eq!(parse_hour("17:42"), Some(17));
        assert_eq!(parse_hour("23:59:59"), Some(23));
    }

    #[test]
    fn parses_hour_from_timestamp() {
        assert_eq!(parse_hour("2023-03-14T08:15:00"), Some(8));
        assert_eq!(parse_hour("2023-03-14T08:15:00.250"), Some(8));
    }

    #[test]
    fn rejects_malformed_time() {
        assert!(parse_hour("").is_none());
        assert!(parse_hour("25:00").is_none());
        assert!(parse_hour("noon").is_none());
    }
}
