// src/pipeline/reconcile.rs

//! New-vs-seen diff against the history store.

use chrono::{DateTime, Utc};

use crate::models::{HistoryStore, PostRecord};

/// Split a parsed batch into genuinely-new records and fold them into the
/// store.
///
/// Returned records keep source order. Each record is checked against the
/// store at the moment it is visited, so a duplicated identity inside one
/// batch collapses to a single entry and a single new record. `last_update`
/// is stamped only when something was inserted.
///
/// Persisting the updated store is the caller's job and must happen before
/// any notification attempt (at-most-once delivery).
pub fn reconcile(
    parsed: Vec<PostRecord>,
    store: &mut HistoryStore,
    now: DateTime<Utc>,
) -> Vec<PostRecord> {
    let mut new_records = Vec::new();

    for record in parsed {
        if store.contains(&record.id) {
            continue;
        }
        store.insert(record.clone());
        new_records.push(record);
    }

    if !new_records.is_empty() {
        store.last_update = now;
    }
    new_records
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

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

    #[test]
    fn empty_store_takes_everything() {
        let mut store = HistoryStore::new(now() - Duration::days(1));
        let new = reconcile(vec![record("a", 0), record("b", 1)], &mut store, now());

        assert_eq!(new.len(), 2);
        assert_eq!(store.entries.len(), 2);
        assert_eq!(store.last_update, now());
    }

    #[test]
    fn seen_ids_are_excluded() {
        let mut store = HistoryStore::new(now());
        store.insert(record("a", 1));

        let new = reconcile(vec![record("a", 1), record("b", 2)], &mut store, now());

        assert_eq!(new.len(), 1);
        assert_eq!(new[0].id, "b");
        assert!(store.contains("a"));
        assert!(store.contains("b"));
    }

    #[test]
    fn second_pass_is_idempotent() {
        let batch = vec![record("a", 0), record("b", 1)];
        let mut store = HistoryStore::new(now());

        let first = reconcile(batch.clone(), &mut store, now());
        let second = reconcile(batch, &mut store, now());

        assert_eq!(first.len(), 2);
        assert!(second.is_empty());
    }

    #[test]
    fn new_records_disjoint_from_prior_keys() {
        let mut store = HistoryStore::new(now());
        store.insert(record("x", 1));
        store.insert(record("y", 1));
        let prior: Vec<String> = store.entries.keys().cloned().collect();

        let new = reconcile(
            vec![record("x", 1), record("z", 0), record("y", 1)],
            &mut store,
            now(),
        );

        assert!(new.iter().all(|r| !prior.contains(&r.id)));
        assert_eq!(new.len(), 1);
    }

    #[test]
    fn duplicate_id_within_batch_collapses() {
        let mut store = HistoryStore::new(now());
        let new = reconcile(vec![record("a", 0), record("a", 0)], &mut store, now());

        assert_eq!(new.len(), 1);
        assert_eq!(store.entries.len(), 1);
    }

    #[test]
    fn no_new_records_leaves_last_update_alone() {
        let created = now() - Duration::days(2);
        let mut store = HistoryStore::new(created);
        store.insert(record("a", 1));
        store.last_update = created;

        let new = reconcile(vec![record("a", 1)], &mut store, now());

        assert!(new.is_empty());
        assert_eq!(store.last_update, created);
    }

    #[test]
    fn source_order_is_preserved() {
        let mut store = HistoryStore::new(now());
        let new = reconcile(
            vec![record("c", 0), record("a", 0), record("b", 0)],
            &mut store,
            now(),
        );

        let ids: Vec<&str> = new.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }
}
