// src/models/selectors.rs

//! CSS selectors describing the activity-page extraction contract.

use serde::{Deserialize, Serialize};

/// CSS selectors for scraping the user's reply listing.
///
/// This is the only site-specific piece of the pipeline; everything
/// downstream works on [`PostRecord`](crate::models::PostRecord)s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSelectors {
    /// Selector for each post row in the listing
    pub row_selector: String,

    /// Selector for the thread title link within a row
    pub title_selector: String,

    /// Selector for the post timestamp element within a row
    pub timestamp_selector: String,

    /// Selector for the post body within a row
    pub body_selector: String,

    /// Selector for the element carrying the floor number (e.g. "#12")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor_selector: Option<String>,

    /// HTML attribute name for extracting links (usually "href")
    #[serde(default = "default_link_attr")]
    pub link_attr: String,

    /// Row attribute holding a ready-made identity token, if the site
    /// provides one
    #[serde(default = "default_identity_attr")]
    pub identity_attr: String,
}

fn default_link_attr() -> String {
    "href".to_string()
}

fn default_identity_attr() -> String {
    "id".to_string()
}

impl Default for PostSelectors {
    fn default() -> Self {
        Self {
            row_selector: "div.postrow".to_string(),
            title_selector: "a[href*='tid=']".to_string(),
            timestamp_selector: "div.postdate".to_string(),
            body_selector: "div.postcontent".to_string(),
            floor_selector: Some("div.authorinfo".to_string()),
            link_attr: default_link_attr(),
            identity_attr: default_identity_attr(),
        }
    }
}
