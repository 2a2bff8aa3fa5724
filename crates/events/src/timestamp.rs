//! Timestamp and identifier generation helpers.
//!
//! Timestamps are ISO-8601 strings compared lexicographically; nothing in
//! the ledger parses them back into calendar types.

use chrono::Utc;

/// Cheap shape check for an ISO-8601 timestamp (`YYYY-MM-DDTHH:MM:SS...`).
pub fn is_valid(timestamp: &str) -> bool {
    let b = timestamp.as_bytes();
    b.len() >= 19 && b[4] == b'-' && b[7] == b'-' && b[10] == b'T'
}

/// Inclusive lexicographic range check.
pub fn in_range(timestamp: &str, start: &str, end: &str) -> bool {
    timestamp >= start && timestamp <= end
}

/// Current UTC time with millisecond precision, e.g.
/// `2026-08-06T09:15:42.108Z`. Used as the WAL receipt timestamp.
pub fn now_utc() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Generate a transaction id from the current time:
/// `TXN` + `%Y%m%d%H%M%S` + milliseconds.
///
/// Not guaranteed unique under concurrent generation within the same
/// millisecond; the duplicate check at append time is the backstop.
pub fn generate_transaction_id() -> String {
    format!("TXN{}", Utc::now().format("%Y%m%d%H%M%S%3f"))
}
