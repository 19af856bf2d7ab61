//! Fixed-format timestamp coercion for export DATE cells.
//!
//! Formats are tried in order; naive values are taken as UTC. Anything that
//! matches none of them coerces to `None` and the caller counts a warning.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Naive datetime formats, LinkedIn's own export format first.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S UTC",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Formats carrying an explicit numeric offset.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%d %H:%M:%S%z"];

const DATE_ONLY_FORMAT: &str = "%Y-%m-%d";

/// Spreadsheet serial day numbers accepted when a workbook cell carries a
/// date as a bare number (1927-05-18 .. 9999-12-31). The lower bound keeps
/// small integers such as a bare year from reading as dates.
const MIN_SERIAL: f64 = 10_000.0;
const MAX_SERIAL: f64 = 2_958_465.0;

/// Parse a DATE cell. Returns `None` for empty or unrecognized values.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, DATE_ONLY_FORMAT) {
        return date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive));
    }

    parse_serial(value)
}

/// Spreadsheet serial date (days since 1899-12-30, fractional part = time).
fn parse_serial(value: &str) -> Option<DateTime<Utc>> {
    let serial: f64 = value.parse().ok()?;
    if !(MIN_SERIAL..=MAX_SERIAL).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    let naive = epoch.checked_add_signed(Duration::milliseconds(millis))?;
    Some(Utc.from_utc_datetime(&naive))
}
