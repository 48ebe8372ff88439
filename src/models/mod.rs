// src/models/mod.rs

//! Domain models for the monitor application.

mod config;
mod history;
mod post;
mod selectors;

// Re-export all public types
pub use config::{Config, CrawlerConfig, HistoryConfig, PushConfig, WatchConfig};
pub use history::HistoryStore;
pub use post::PostRecord;
pub use selectors::PostSelectors;
