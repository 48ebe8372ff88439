// src/services/parser.rs

//! Record parser: activity-page markup → normalized post records.
//!
//! Rows are parsed independently; a malformed row is logged and skipped,
//! never aborting the batch.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Config, PostRecord};
use crate::pipeline::window::{fallback_timestamp, within_window};
use crate::utils::{extract_floor, extract_thread_id, resolve_url};

/// Timestamp formats accepted from the source, most specific first.
const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parser for the user's reply listing, with the selector contract compiled
/// up front.
pub struct PostParser {
    row_sel: Selector,
    title_sel: Selector,
    timestamp_sel: Selector,
    body_sel: Selector,
    floor_sel: Option<Selector>,
    link_attr: String,
    identity_attr: String,
    base_url: Url,
    horizon_days: i64,
    source_offset: FixedOffset,
}

impl PostParser {
    /// Compile the configured selector contract.
    pub fn new(config: &Config) -> Result<Self> {
        let sels = &config.selectors;
        let source_offset = FixedOffset::east_opt(config.watch.utc_offset_hours * 3600)
            .ok_or_else(|| AppError::config("watch.utc_offset_hours out of range"))?;

        Ok(Self {
            row_sel: Self::parse_selector(&sels.row_selector)?,
            title_sel: Self::parse_selector(&sels.title_selector)?,
            timestamp_sel: Self::parse_selector(&sels.timestamp_selector)?,
            body_sel: Self::parse_selector(&sels.body_selector)?,
            floor_sel: sels
                .floor_selector
                .as_ref()
                .map(|s| Self::parse_selector(s))
                .transpose()?,
            link_attr: sels.link_attr.clone(),
            identity_attr: sels.identity_attr.clone(),
            base_url: Url::parse(&config.watch.base_url)?,
            horizon_days: config.watch.horizon_days,
            source_offset,
        })
    }

    /// Parse the raw listing into records, in source document order.
    ///
    /// Rows without a stable identity or outside the retention window are
    /// dropped here; stale items have no business downstream.
    pub fn parse(&self, raw_markup: &str, now: DateTime<Utc>) -> Vec<PostRecord> {
        let document = Html::parse_document(raw_markup);
        let mut records = Vec::new();

        for row in document.select(&self.row_sel) {
            match self.parse_row(&row, now) {
                Some(record) => records.push(record),
                None => log::debug!("Skipping row without usable identity or timestamp"),
            }
        }
        records
    }

    fn parse_row(&self, row: &ElementRef, now: DateTime<Utc>) -> Option<PostRecord> {
        let title_elem = row.select(&self.title_sel).next();

        let (thread_title, thread_url) = match title_elem {
            Some(elem) => {
                let raw_title: String = elem.text().collect();
                let href = elem.value().attr(self.link_attr.as_str()).unwrap_or("");
                let link = if href.is_empty() {
                    String::new()
                } else {
                    resolve_url(&self.base_url, href)
                };
                (raw_title.trim().to_string(), link)
            }
            None => (String::new(), String::new()),
        };

        let id = self.extract_identity(row, &thread_url)?;

        let raw_timestamp = row
            .select(&self.timestamp_sel)
            .next()
            .map(|elem| elem.text().collect::<String>())
            .unwrap_or_default();
        let timestamp = self.parse_timestamp(raw_timestamp.trim(), now);

        if !within_window(timestamp, now, self.horizon_days) {
            log::debug!("Dropping stale post {id} ({raw_timestamp})");
            return None;
        }

        let content = row
            .select(&self.body_sel)
            .next()
            .map(|elem| Self::collect_text(&elem))
            .unwrap_or_default();

        Some(PostRecord {
            id,
            timestamp,
            thread_title,
            thread_url,
            content,
            observed_at: now,
        })
    }

    /// Stable identity: the row's identity attribute when the site provides
    /// one, else `{thread_id}_{floor}`. Rows yielding neither cannot be
    /// deduplicated safely and are discarded.
    fn extract_identity(&self, row: &ElementRef, thread_url: &str) -> Option<String> {
        if let Some(value) = row.value().attr(self.identity_attr.as_str()) {
            if !value.trim().is_empty() {
                return Some(value.trim().to_string());
            }
        }

        let thread_id = extract_thread_id(thread_url)?;
        let floor_text = self
            .floor_sel
            .as_ref()
            .and_then(|sel| row.select(sel).next())
            .map(|elem| elem.text().collect::<String>())?;
        let floor = extract_floor(&floor_text)?;
        Some(format!("{thread_id}_{floor}"))
    }

    /// Parse a source timestamp against the accepted formats.
    ///
    /// Unparsable values map to a sentinel older than the horizon so the
    /// record is filtered out rather than kept by default.
    fn parse_timestamp(&self, raw: &str, now: DateTime<Utc>) -> DateTime<Utc> {
        let naive = TIMESTAMP_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(raw, DATE_FORMAT)
                    .ok()
                    .map(|d| d.and_hms_opt(0, 0, 0).expect("midnight is valid"))
            });

        match naive {
            Some(naive) => naive
                .and_local_timezone(self.source_offset)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|| fallback_timestamp(now, self.horizon_days)),
            None => fallback_timestamp(now, self.horizon_days),
        }
    }

    /// Body text with media stripped: text segments in document order,
    /// joined with single newlines.
    fn collect_text(elem: &ElementRef) -> String {
        elem.text()
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn parser() -> PostParser {
        PostParser::new(&Config::default()).unwrap()
    }

    fn now() -> DateTime<Utc> {
        // 2026-08-30 12:00 UTC == 2026-08-30 20:00 at the default +8 offset
        Utc.with_ymd_and_hms(2026, 8, 30, 12, 0, 0).unwrap()
    }

    fn row(id_attr: &str, href: &str, date: &str, body: &str) -> String {
        format!(
            r#"<div class="postrow"{id_attr}>
                 <a href="{href}">Thread title</a>
                 <div class="postdate">{date}</div>
                 <div class="authorinfo">#7 posted</div>
                 <div class="postcontent">{body}</div>
               </div>"#,
        )
    }

    #[test]
    fn parses_well_formed_row() {
        let html = row(
            r#" id="post_1""#,
            "/read.php?tid=100",
            "2026-08-30 10:00",
            "hello",
        );
        let records = parser().parse(&html, now());

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.id, "post_1");
        assert_eq!(record.thread_title, "Thread title");
        assert_eq!(record.thread_url, "https://nga.178.com/read.php?tid=100");
        assert_eq!(record.content, "hello");
        assert_eq!(record.observed_at, now());
    }

    #[test]
    fn derives_identity_from_thread_and_floor() {
        let html = row("", "/read.php?tid=4321", "2026-08-30 10:00", "x");
        let records = parser().parse(&html, now());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "4321_7");
    }

    #[test]
    fn row_without_identity_is_skipped_not_fatal() {
        let bad = r#"<div class="postrow">
             <a href="/read.php?page=2">No thread id</a>
             <div class="postdate">2026-08-30 10:00</div>
             <div class="postcontent">x</div>
           </div>"#;
        let good = row(r#" id="post_2""#, "/read.php?tid=5", "2026-08-30 10:00", "y");
        let records = parser().parse(&format!("{bad}{good}"), now());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "post_2");
    }

    #[test]
    fn unparsable_timestamp_is_filtered_out() {
        let html = row(r#" id="post_3""#, "/read.php?tid=9", "yesterday-ish", "x");
        assert!(parser().parse(&html, now()).is_empty());
    }

    #[test]
    fn stale_row_is_dropped() {
        let html = row(r#" id="post_4""#, "/read.php?tid=9", "2026-08-20 10:00", "x");
        assert!(parser().parse(&html, now()).is_empty());
    }

    #[test]
    fn date_only_format_is_accepted() {
        let html = row(r#" id="post_5""#, "/read.php?tid=9", "2026-08-30", "x");
        let records = parser().parse(&html, now());

        assert_eq!(records.len(), 1);
        // Midnight local (+8) == 16:00 UTC the previous day
        assert_eq!(
            records[0].timestamp,
            Utc.with_ymd_and_hms(2026, 8, 29, 16, 0, 0).unwrap()
        );
    }

    #[test]
    fn body_segments_join_with_newlines_and_media_vanish() {
        let html = row(
            r#" id="post_6""#,
            "/read.php?tid=9",
            "2026-08-30 10:00",
            r#"line one<br>line two<img src="pic.png">"#,
        );
        let records = parser().parse(&html, now());

        assert_eq!(records[0].content, "line one\nline two");
    }

    #[test]
    fn source_order_is_preserved() {
        let html = format!(
            "{}{}",
            row(r#" id="b""#, "/read.php?tid=2", "2026-08-30 10:00", "x"),
            row(r#" id="a""#, "/read.php?tid=1", "2026-08-30 11:00", "y"),
        );
        let records = parser().parse(&html, now());

        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn timestamp_converts_from_source_offset() {
        let html = row(r#" id="post_7""#, "/read.php?tid=9", "2026-08-30 20:00", "x");
        let records = parser().parse(&html, now());

        // 20:00 at +8 is exactly 12:00 UTC
        assert_eq!(records[0].timestamp, now());
    }

    #[test]
    fn window_boundary_is_inclusive() {
        // Exactly horizon_days old: 2026-08-27 20:00 +8 == 2026-08-27 12:00 UTC
        let html = row(r#" id="edge""#, "/read.php?tid=9", "2026-08-27 20:00", "x");
        let records = parser().parse(&html, now());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].timestamp, now() - Duration::days(3));
    }
}
