use chrono::{DateTime, NaiveDateTime};
use diesel::SqliteConnection;
use tracing::{debug, warn};

use super::types::{IngestReport, ParsedFeed, ParsedItem, PUB_DATE_FORMAT, WEEKDAYS};
use crate::models::post::NewPost;

/// Store a parsed feed's items as posts of `feed_id`.
///
/// Items are processed in document order, each in its own statement. An
/// item already stored under the same (feed, link) is skipped, and a
/// storage error on one item is logged without stopping the batch.
pub fn ingest_items(
    conn: &mut SqliteConnection,
    feed_id: &str,
    parsed: &ParsedFeed,
) -> IngestReport {
    let mut report = IngestReport::default();

    for item in &parsed.items {
        let link = post_link(item, parsed);
        let published_at = parse_pub_date(&item.pub_date);
        if published_at.is_none() && !item.pub_date.is_empty() {
            debug!(feed_id, pub_date = %item.pub_date, "Unparseable publish date");
        }

        let post = NewPost {
            description: Some(item.description.as_str()).filter(|d| !d.is_empty()),
            published_at,
            ..NewPost::new(feed_id, &item.title, link)
        };

        match post.insert_if_not_present(conn) {
            Ok(true) => report.inserted += 1,
            Ok(false) => {
                debug!(feed_id, link, "Post already exists");
                report.skipped += 1;
            }
            Err(e) => {
                warn!(feed_id, link, error = %e, "Error inserting post");
                report.failed += 1;
            }
        }
    }

    report
}

/// The item's own link, or the channel link when the item has none.
pub fn post_link<'a>(item: &'a ParsedItem, feed: &'a ParsedFeed) -> &'a str {
    match item.link.trim() {
        "" => feed.link.trim(),
        link => link,
    }
}

/// Parse an RFC 1123 date with numeric zone into UTC.
///
/// The weekday must be a valid name but need not match the date; feeds in
/// the wild often get it wrong.
pub fn parse_pub_date(text: &str) -> Option<NaiveDateTime> {
    let (weekday, rest) = text.trim().split_once(", ")?;
    if !WEEKDAYS.contains(&weekday) {
        return None;
    }
    DateTime::parse_from_str(rest, PUB_DATE_FORMAT)
        .ok()
        .map(|dt| dt.naive_utc())
}
