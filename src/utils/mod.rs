//! Utility functions and helpers.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Extract the thread id from a forum URL (`tid=123` style links).
pub fn extract_thread_id(url: &str) -> Option<String> {
    static TID: OnceLock<Regex> = OnceLock::new();
    let re = TID.get_or_init(|| Regex::new(r"[?&]tid=(\d+)").expect("valid tid pattern"));
    re.captures(url).map(|caps| caps[1].to_string())
}

/// Extract the floor number from an author-info text blob (`#12` style).
pub fn extract_floor(text: &str) -> Option<String> {
    static FLOOR: OnceLock<Regex> = OnceLock::new();
    let re = FLOOR.get_or_init(|| Regex::new(r"#(\d+)").expect("valid floor pattern"));
    re.captures(text).map(|caps| caps[1].to_string())
}
