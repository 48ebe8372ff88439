// src/services/notify.rs

//! Notification formatting and the push collaborator.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{PostRecord, PushConfig};

/// Message returned for an empty batch. Callers must treat it as
/// "do not send", never as a message to push.
pub const NO_NEW_POSTS: &str = "No new posts.";

/// Separator between notification blocks.
const BLOCK_SEPARATOR: &str = "\n\n---\n\n";

/// Render a batch of new records into one human-readable message.
pub fn format_batch(new_records: &[PostRecord]) -> String {
    if new_records.is_empty() {
        return NO_NEW_POSTS.to_string();
    }

    new_records
        .iter()
        .enumerate()
        .map(|(i, record)| record.format_block(i + 1))
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

/// Build the distinct failure message pushed when the fetch step fails.
pub fn format_failure(uid: &str, error: &AppError, now: DateTime<Utc>) -> (String, String) {
    let title = format!("Monitor fetch failed (uid {uid})");
    let body = format!(
        "Fetching the activity page failed.\n\n\
         - Time: {}\n\
         - Cause: {error}\n\
         - Hint: check whether the session cookie expired or the site is reachable.",
        now.format("%Y-%m-%d %H:%M:%S UTC"),
    );
    (title, body)
}

/// Black-box push call: one title, one markdown-flavored body.
#[async_trait]
pub trait PushChannel: Send + Sync {
    async fn send(&self, title: &str, body: &str) -> Result<()>;
}

/// ServerChan-style push endpoint.
///
/// Posts form fields `title` and `desp`; the response JSON carries a `code`
/// field where zero means accepted.
pub struct ServerChan {
    client: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    code: i64,
    #[serde(default)]
    message: Option<String>,
}

impl ServerChan {
    /// Build a channel when a send key is configured.
    pub fn from_config(config: &PushConfig) -> Result<Option<Self>> {
        let Some(key) = &config.send_key else {
            return Ok(None);
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Some(Self {
            client,
            url: config.endpoint.replace("{key}", key),
        }))
    }

    fn decode(response: &PushResponse) -> Result<()> {
        if response.code == 0 {
            Ok(())
        } else {
            Err(AppError::push(format!(
                "endpoint returned code {}: {}",
                response.code,
                response.message.as_deref().unwrap_or("no message")
            )))
        }
    }
}

#[async_trait]
impl PushChannel for ServerChan {
    async fn send(&self, title: &str, body: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .form(&[("title", title), ("desp", body)])
            .send()
            .await?
            .error_for_status()?;

        let parsed: PushResponse = response.json().await?;
        Self::decode(&parsed)
    }
}
