//! Local filesystem persistence for the history store.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::HistoryStore;

/// The history JSON file on disk.
#[derive(Clone)]
pub struct HistoryFile {
    path: PathBuf,
}

impl HistoryFile {
    /// Create a handle for the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The path this store persists to.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Load the store, apply the retention pass, persist the cleaned result.
    ///
    /// A missing or unreadable file degrades to a fresh empty store, which
    /// is persisted immediately so a crash before any post is seen still
    /// leaves a valid file behind. Persistence failures are logged and never
    /// fail the run.
    pub async fn load_and_clean(&self, now: DateTime<Utc>, horizon_days: i64) -> HistoryStore {
        let mut store = match self.read().await {
            Ok(Some(store)) => store,
            Ok(None) => {
                log::info!(
                    "No history file at {}, starting with an empty store",
                    self.path.display()
                );
                HistoryStore::new(now)
            }
            Err(e) => {
                log::warn!(
                    "History file {} unreadable ({}), starting fresh",
                    self.path.display(),
                    e
                );
                HistoryStore::new(now)
            }
        };

        let purged = store.retain_within(now, horizon_days);
        if purged > 0 {
            log::info!("Retention pass purged {purged} entries older than {horizon_days} days");
        }

        if let Err(e) = self.save(&store).await {
            log::warn!("Failed to persist cleaned history: {e}");
        }
        store
    }

    /// Write the full store atomically (write to temp, then rename).
    pub async fn save(&self, store: &HistoryStore) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let bytes = serde_json::to_vec_pretty(store)?;
        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read the persisted store, `None` if the file does not exist.
    pub async fn read(&self) -> Result<Option<HistoryStore>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostRecord;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 30, 12, 0, 0).unwrap()
    }

    fn record(id: &str, age_days: i64) -> PostRecord {
        PostRecord {
            id: id.to_string(),
            timestamp: now() - Duration::days(age_days),
            thread_title: format!("Thread {id}"),
            thread_url: format!("https://forum.example.com/read.php?tid={id}"),
            content: "body".to_string(),
            observed_at: now(),
        }
    }

    fn history(tmp: &TempDir) -> HistoryFile {
        HistoryFile::new(tmp.path().join("history.json"))
    }

    #[tokio::test]
    async fn save_then_read_round_trips_exactly() {
        let tmp = TempDir::new().unwrap();
        let file = history(&tmp);

        let mut store = HistoryStore::new(now());
        store.insert(record("a", 1));
        store.insert(record("b", 2));
        file.save(&store).await.unwrap();

        let loaded = file.read().await.unwrap().unwrap();
        assert_eq!(loaded, store);
    }

    #[tokio::test]
    async fn missing_file_yields_persisted_empty_store() {
        let tmp = TempDir::new().unwrap();
        let file = history(&tmp);

        let store = file.load_and_clean(now(), 3).await;

        assert!(store.entries.is_empty());
        // The empty store must be on disk immediately.
        let reloaded = file.read().await.unwrap().unwrap();
        assert_eq!(reloaded, store);
    }

    #[tokio::test]
    async fn corrupt_file_degrades_to_fresh_store() {
        let tmp = TempDir::new().unwrap();
        let file = history(&tmp);
        tokio::fs::write(file.path(), b"{ not json").await.unwrap();

        let store = file.load_and_clean(now(), 3).await;

        assert!(store.entries.is_empty());
        let reloaded = file.read().await.unwrap().unwrap();
        assert_eq!(reloaded, store);
    }

    #[tokio::test]
    async fn cleaning_purges_stale_and_persists() {
        let tmp = TempDir::new().unwrap();
        let file = history(&tmp);

        let mut store = HistoryStore::new(now() - Duration::days(5));
        store.insert(record("old", 4));
        store.insert(record("fresh", 1));
        file.save(&store).await.unwrap();

        let cleaned = file.load_and_clean(now(), 3).await;

        assert!(!cleaned.contains("old"));
        assert!(cleaned.contains("fresh"));
        assert_eq!(cleaned.last_clean, now());

        let on_disk = file.read().await.unwrap().unwrap();
        assert_eq!(on_disk, cleaned);
    }

    #[tokio::test]
    async fn repeated_cleaning_is_drift_free() {
        let tmp = TempDir::new().unwrap();
        let file = history(&tmp);

        let mut store = HistoryStore::new(now());
        store.insert(record("edge", 3)); // exactly on the boundary
        store.insert(record("mid", 1));
        file.save(&store).await.unwrap();

        let first = file.load_and_clean(now(), 3).await;
        let second = file.load_and_clean(now(), 3).await;

        assert_eq!(first.entries, second.entries);
        assert!(first.contains("edge"));
    }

    #[tokio::test]
    async fn save_leaves_no_temp_file() {
        let tmp = TempDir::new().unwrap();
        let file = history(&tmp);

        file.save(&HistoryStore::new(now())).await.unwrap();

        assert!(file.path().exists());
        assert!(!file.path().with_extension("tmp").exists());
    }
}
