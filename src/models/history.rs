//! Durable "seen" history of posts.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::PostRecord;
use crate::pipeline::window::within_window;

/// Mapping from post identity to record, plus lifecycle timestamps.
///
/// This is the only persisted state of the application. Only the reconciler
/// and the retention pass mutate it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryStore {
    /// Seen posts keyed by identity (BTreeMap for stable file output)
    pub entries: BTreeMap<String, PostRecord>,

    /// Timestamp of the last entry mutation
    pub last_update: DateTime<Utc>,

    /// Timestamp of the last retention pass
    pub last_clean: DateTime<Utc>,
}

impl HistoryStore {
    /// Create an empty store stamped with the current run time.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            entries: BTreeMap::new(),
            last_update: now,
            last_clean: now,
        }
    }

    /// Whether a post identity has already been seen.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Insert a record, last write wins for a repeated identity.
    pub fn insert(&mut self, record: PostRecord) {
        self.entries.insert(record.id.clone(), record);
    }

    /// Drop every entry outside the retention window.
    ///
    /// Returns the number of purged entries and stamps `last_clean`.
    pub fn retain_within(&mut self, now: DateTime<Utc>, horizon_days: i64) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, record| within_window(record.timestamp, now, horizon_days));
        self.last_clean = now;
        before - self.entries.len()
    }
}
