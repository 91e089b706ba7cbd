//! Text formatting of times and durations

use chrono::{DateTime, Utc};

/// Human-readable elapsed time between `start` and `end`
///
/// `None` when either end is missing or `end` precedes `start`. Otherwise
/// `"45s"` under a minute, `"3m 7s"` under an hour and `"2h 5m"` beyond.
pub fn format_duration(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Option<String> {
    let (start, end) = (start?, end?);
    if end < start {
        return None;
    }

    let secs = (end - start).num_seconds();
    let mins = secs / 60;
    if mins == 0 {
        return Some(format!("{secs}s"));
    }
    if mins < 60 {
        return Some(format!("{mins}m {}s", secs % 60));
    }
    Some(format!("{}h {}m", mins / 60, mins % 60))
}

/// `YYYY-MM-DD HH:MM:SS` in UTC
pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Compact start stamp used in sheet names, e.g. `Mar 01 10-00`
///
/// Hours and minutes are separated by `-` because `:` is not allowed in sheet
/// names.
pub fn format_sheet_stamp(time: &DateTime<Utc>) -> String {
    time.format("%b %d %H-%M").to_string()
}
