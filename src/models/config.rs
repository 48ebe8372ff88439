//! Application configuration structures.

use std::fs;
use std::path::Path;

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::PostSelectors;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// What to watch: account, site, retention window
    #[serde(default)]
    pub watch: WatchConfig,

    /// HTTP behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Push-notification settings
    #[serde(default)]
    pub push: PushConfig,

    /// Activity-page extraction contract
    #[serde(default)]
    pub selectors: PostSelectors,

    /// History-file settings
    #[serde(default)]
    pub history: HistoryConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Overlay secrets and common knobs from environment variables.
    ///
    /// Recognized: `POSTWATCH_UID`, `POSTWATCH_COOKIE`, `POSTWATCH_SENDKEY`,
    /// `POSTWATCH_HORIZON_DAYS`.
    pub fn apply_env(&mut self) {
        if let Ok(uid) = std::env::var("POSTWATCH_UID") {
            if !uid.trim().is_empty() {
                self.watch.uid = uid;
            }
        }
        if let Ok(cookie) = std::env::var("POSTWATCH_COOKIE") {
            if !cookie.trim().is_empty() {
                self.crawler.cookie = Some(cookie);
            }
        }
        if let Ok(key) = std::env::var("POSTWATCH_SENDKEY") {
            if !key.trim().is_empty() {
                self.push.send_key = Some(key);
            }
        }
        if let Ok(days) = std::env::var("POSTWATCH_HORIZON_DAYS") {
            match days.parse::<i64>() {
                Ok(d) if d > 0 => self.watch.horizon_days = d,
                _ => log::warn!("Ignoring invalid POSTWATCH_HORIZON_DAYS: {days}"),
            }
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.watch.uid.trim().is_empty() {
            return Err(AppError::config("watch.uid is empty"));
        }
        if self.watch.horizon_days <= 0 {
            return Err(AppError::config("watch.horizon_days must be > 0"));
        }
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::config("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::config("crawler.timeout_secs must be > 0"));
        }
        if self.push.timeout_secs == 0 {
            return Err(AppError::config("push.timeout_secs must be > 0"));
        }
        url::Url::parse(&self.watch.base_url)?;

        // The selector contract must compile before a run is attempted.
        let sels = &self.selectors;
        for s in [
            Some(&sels.row_selector),
            Some(&sels.title_selector),
            Some(&sels.timestamp_selector),
            Some(&sels.body_selector),
            sels.floor_selector.as_ref(),
        ]
        .into_iter()
        .flatten()
        {
            Selector::parse(s).map_err(|e| AppError::selector(s.as_str(), format!("{e:?}")))?;
        }
        Ok(())
    }
}

/// What to watch and how far back to look.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Target account identifier on the forum
    #[serde(default = "defaults::uid")]
    pub uid: String,

    /// Forum base URL, used for resolving relative links
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Search path template; `{uid}` is replaced with the account id
    #[serde(default = "defaults::search_path")]
    pub search_path: String,

    /// Rolling retention horizon in days
    #[serde(default = "defaults::horizon_days")]
    pub horizon_days: i64,

    /// Fixed UTC offset (hours) the forum renders naive timestamps in
    #[serde(default = "defaults::utc_offset_hours")]
    pub utc_offset_hours: i32,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            uid: defaults::uid(),
            base_url: defaults::base_url(),
            search_path: defaults::search_path(),
            horizon_days: defaults::horizon_days(),
            utc_offset_hours: defaults::utc_offset_hours(),
        }
    }
}

impl WatchConfig {
    /// Full URL of the user's reply-search page.
    pub fn search_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.search_path.replace("{uid}", &self.uid)
        )
    }
}

/// HTTP client behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Character set the page is served in
    #[serde(default = "defaults::charset")]
    pub charset: String,

    /// Session cookie, opaque to the core; absent means the fetch is
    /// attempted unauthenticated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie: Option<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            charset: defaults::charset(),
            cookie: None,
        }
    }
}

/// Push-notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    /// Endpoint template; `{key}` is replaced with the send key
    #[serde(default = "defaults::push_endpoint")]
    pub endpoint: String,

    /// Send key/token; absent means the notify step is skipped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_key: Option<String>,

    /// Push request timeout in seconds
    #[serde(default = "defaults::push_timeout")]
    pub timeout_secs: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::push_endpoint(),
            send_key: None,
            timeout_secs: defaults::push_timeout(),
        }
    }
}

/// History-file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Path of the persisted history JSON file
    #[serde(default = "defaults::history_path")]
    pub path: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: defaults::history_path(),
        }
    }
}

mod defaults {
    // Watch defaults
    pub fn uid() -> String {
        "150058".into()
    }
    pub fn base_url() -> String {
        "https://nga.178.com".into()
    }
    pub fn search_path() -> String {
        "/thread.php?searchpost=1&authorid={uid}".into()
    }
    pub fn horizon_days() -> i64 {
        3
    }
    pub fn utc_offset_hours() -> i32 {
        8
    }

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".into()
    }
    pub fn timeout() -> u64 {
        15
    }
    pub fn charset() -> String {
        "gbk".into()
    }

    // Push defaults
    pub fn push_endpoint() -> String {
        "https://sctapi.ftqq.com/{key}.send".into()
    }
    pub fn push_timeout() -> u64 {
        15
    }

    // History defaults
    pub fn history_path() -> String {
        "history.json".into()
    }
}
