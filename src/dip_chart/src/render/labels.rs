//! Axis and tooltip label text. All times render in US market time.

use chrono::{DateTime, Utc};
use chrono_tz::America::New_York;

use crate::models::range::LabelMode;

/// Formats a millisecond timestamp for `mode`. [`LabelMode::None`] yields an
/// empty string; a zero or unrepresentable timestamp yields a placeholder.
pub fn format_label(timestamp: i64, mode: LabelMode) -> String {
    match mode {
        LabelMode::None => String::new(),
        LabelMode::Time => format_time(timestamp),
        LabelMode::Date => format_date(timestamp),
        LabelMode::MonthYear => format_month_year(timestamp),
    }
}

/// `14:05`, or `--:--`.
pub fn format_time(timestamp: i64) -> String {
    format_in_market_tz(timestamp, "%H:%M").unwrap_or_else(|| "--:--".to_string())
}

/// `Mar 04`, or `--`.
pub fn format_date(timestamp: i64) -> String {
    format_in_market_tz(timestamp, "%b %d").unwrap_or_else(|| "--".to_string())
}

/// `Mar 2024`, or `--`.
pub fn format_month_year(timestamp: i64) -> String {
    format_in_market_tz(timestamp, "%b %Y").unwrap_or_else(|| "--".to_string())
}

fn format_in_market_tz(timestamp: i64, fmt: &str) -> Option<String> {
    if timestamp == 0 {
        return None;
    }
    let utc: DateTime<Utc> = DateTime::from_timestamp_millis(timestamp)?;
    Some(utc.with_timezone(&New_York).format(fmt).to_string())
}
