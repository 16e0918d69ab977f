use serde::Serialize;

/// Largest response body accepted from a feed.
pub const MAX_FEED_BYTES: usize = 5 * 1024 * 1024;

/// Publish-date layout used by RSS `pubDate` after the `Mon, ` weekday
/// prefix, e.g. `02 Jan 2006 15:04:05 -0700`.
pub const PUB_DATE_FORMAT: &str = "%d %b %Y %H:%M:%S %z";

/// Weekday names accepted in front of a `pubDate`.
pub const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Channel of an RSS document. Missing fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedFeed {
    pub title: String,
    pub link: String,
    pub description: String,
    /// document order
    pub items: Vec<ParsedItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedItem {
    pub title: String,
    pub link: String,
    pub description: String,
    /// raw `pubDate` text, parsed during ingestion
    pub pub_date: String,
}

/// Result of storing one feed's items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// posts written by this batch
    pub inserted: usize,
    /// items already stored for this feed
    pub skipped: usize,
    /// items lost to storage errors
    pub failed: usize,
}

impl IngestReport {
    pub fn total(&self) -> usize {
        self.inserted + self.skipped + self.failed
    }
}
