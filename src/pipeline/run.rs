// src/pipeline/run.rs

//! One monitor pass: fetch → parse → reconcile → notify.
//!
//! Failure policy per step:
//! - fetch: fatal; a best-effort failure notification is sent and the error
//!   propagates so the process exits non-zero. The history file is untouched.
//! - parse: item failures are recovered inside the parser.
//! - persistence: logged, the run continues with in-memory state.
//! - notify: logged, the run still completes successfully.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::Config;
use crate::pipeline::reconcile;
use crate::services::notify::{format_batch, format_failure};
use crate::services::{PageFetcher, PostParser, PushChannel};
use crate::storage::HistoryFile;

/// What happened during a run, for the end-of-run summary log.
#[derive(Debug, Default)]
pub struct RunReport {
    /// In-window posts parsed from the page
    pub parsed: usize,
    /// Posts not seen in any previous run
    pub new_posts: usize,
    /// `Some(true)` pushed, `Some(false)` push failed, `None` skipped
    pub notified: Option<bool>,
}

/// Execute one monitor pass.
pub async fn run_monitor(
    config: &Config,
    fetcher: &dyn PageFetcher,
    history: &HistoryFile,
    channel: Option<&dyn PushChannel>,
    now: DateTime<Utc>,
) -> Result<RunReport> {
    // Compile the selector contract up front; a broken contract is a
    // configuration problem, not a crawl result.
    let parser = PostParser::new(config)?;

    let url = config.watch.search_url();
    log::info!("Fetching activity page for uid {}: {}", config.watch.uid, url);

    let raw = match fetcher.fetch(&url).await {
        Ok(raw) => raw,
        Err(e) => {
            log::error!("Fetch failed: {e}");
            notify_failure(config, channel, &e, now).await;
            return Err(e);
        }
    };

    // The retention pass runs only after a successful fetch so a transport
    // failure leaves the history file byte-identical.
    let mut store = history
        .load_and_clean(now, config.watch.horizon_days)
        .await;

    let parsed = parser.parse(&raw, now);
    log::info!("Parsed {} in-window posts", parsed.len());

    let mut report = RunReport {
        parsed: parsed.len(),
        ..RunReport::default()
    };

    let new_records = reconcile(parsed, &mut store, now);
    report.new_posts = new_records.len();
    log::info!("{} new posts after reconciliation", new_records.len());

    if new_records.is_empty() {
        log::info!("Nothing to push");
        return Ok(report);
    }

    // Persist before the notification attempt: a crash between persist and
    // notify drops a push, which beats duplicating it on the next run.
    if let Err(e) = history.save(&store).await {
        log::warn!("Failed to persist history, continuing in-memory: {e}");
    }

    match channel {
        Some(channel) => {
            let title = format!(
                "{} new posts from uid {}",
                new_records.len(),
                config.watch.uid
            );
            let message = format_batch(&new_records);
            match channel.send(&title, &message).await {
                Ok(()) => {
                    log::info!("Notification pushed");
                    report.notified = Some(true);
                }
                Err(e) => {
                    log::warn!("Notification failed: {e}");
                    report.notified = Some(false);
                }
            }
        }
        None => log::info!("No push channel configured, skipping notification"),
    }

    Ok(report)
}

/// Best-effort failure push for a fetch error.
async fn notify_failure(
    config: &Config,
    channel: Option<&dyn PushChannel>,
    error: &crate::error::AppError,
    now: DateTime<Utc>,
) {
    let Some(channel) = channel else {
        log::info!("No push channel configured, skipping failure notification");
        return;
    };

    let (title, body) = format_failure(&config.watch.uid, error, now);
    if let Err(e) = channel.send(&title, &body).await {
        log::warn!("Failure notification could not be pushed: {e}");
    }
}
