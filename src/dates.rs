//src/dates.rs
use chrono::{DateTime, Local};

/// Formats a moment as its local calendar date key (`YYYY-MM-DD`,
/// zero-padded). Two moments within the same local day always produce
/// equal keys, regardless of time of day.
pub fn format_date_key(moment: DateTime<Local>) -> String {
    moment.format("%Y-%m-%d").to_string()
}

/// Date key for the current local day.
pub fn today_key() -> String {
    format_date_key(Local::now())
}

/// Full English weekday name for display. Cosmetic only; never used for
/// ordering or equality.
pub fn weekday_name(moment: DateTime<Local>) -> String {
    moment.format("%A").to_string()
}
