use rss::Channel;

use super::types::{ParsedFeed, ParsedItem};
use crate::errors::AppResult;

/// Parse an RSS 2.0 document.
///
/// Missing optional fields become empty strings. Items are returned in
/// document order; nothing here assumes they are chronological.
pub fn parse_feed(body: &[u8]) -> AppResult<ParsedFeed> {
    let channel = Channel::read_from(body)?;

    let items = channel
        .items()
        .iter()
        .map(|item| ParsedItem {
            title: item.title().unwrap_or_default().to_string(),
            link: item.link().unwrap_or_default().to_string(),
            description: item.description().unwrap_or_default().to_string(),
            pub_date: item.pub_date().unwrap_or_default().to_string(),
        })
        .collect();

    Ok(ParsedFeed {
        title: channel.title().to_string(),
        link: channel.link().to_string(),
        description: channel.description().to_string(),
        items,
    })
}
