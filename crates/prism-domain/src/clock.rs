//! Wall-clock helpers
//!
//! All timestamps in Prism are milliseconds since the Unix epoch.

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds in one day
pub const MILLIS_PER_DAY: u64 = 86_400_000;

/// Current timestamp in milliseconds since the Unix epoch
///
/// A clock set before the epoch reads as 0.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Age in fractional days between `timestamp` and `now`
///
/// Timestamps in the future have age 0.
pub fn age_days(timestamp: u64, now: u64) -> f64 {
    now.saturating_sub(timestamp) as f64 / MILLIS_PER_DAY as f64
}
