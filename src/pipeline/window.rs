// src/pipeline/window.rs

//! Rolling time-window retention policy.
//!
//! `now` is always supplied by the caller so both functions stay
//! deterministic under test.

use chrono::{DateTime, Duration, Utc};

/// Whether a timestamp falls inside the retention horizon.
///
/// The lower bound is inclusive: a post made exactly `horizon_days` ago is
/// still inside the window.
pub fn within_window(timestamp: DateTime<Utc>, now: DateTime<Utc>, horizon_days: i64) -> bool {
    timestamp >= now - Duration::days(horizon_days)
}

/// Sentinel timestamp for posts whose source timestamp cannot be parsed.
///
/// One day older than the horizon, so the record is filtered out instead of
/// being kept by default.
pub fn fallback_timestamp(now: DateTime<Utc>, horizon_days: i64) -> DateTime<Utc> {
    now - Duration::days(horizon_days + 1)
}
