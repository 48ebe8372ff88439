//! Post record data structure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observed reply/post by the watched user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostRecord {
    /// Stable unique identity, reproducible across runs.
    ///
    /// Either the row's identity attribute or `{thread_id}_{floor}`.
    pub id: String,

    /// When the post was made (source timestamp, normalized to UTC)
    pub timestamp: DateTime<Utc>,

    /// Title of the thread the post belongs to
    pub thread_title: String,

    /// Absolute link to the thread
    pub thread_url: String,

    /// Plain-text body with markup and media stripped
    pub content: String,

    /// When this run captured the record (diagnostics only, not identity)
    pub observed_at: DateTime<Utc>,
}

impl PostRecord {
    /// Render this record as one numbered notification block.
    pub fn format_block(&self, index: usize) -> String {
        format!(
            "#{index} [{time}]\nThread: {title}\nLink: {link}\n\n{body}",
            index = index,
            time = self.timestamp.format("%Y-%m-%d %H:%M"),
            title = self.thread_title,
            link = self.thread_url,
            body = self.content,
        )
    }
}
