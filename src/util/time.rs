use chrono::{DateTime, Utc};

/// Epoch milliseconds to a UTC timestamp. Zero (legacy entries without a
/// timestamp) and out-of-range values yield `None`.
pub fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    if ms <= 0 {
        return None;
    }
    DateTime::<Utc>::from_timestamp_millis(ms)
}

// Short listing form, e.g. "2025-03-01 18:30".
pub fn format_millis(ms: i64) -> String {
    match from_millis(ms) {
        Some(ts) => ts.format("%Y-%m-%d %H:%M").to_string(),
        None => "-".to_string(),
    }
}
