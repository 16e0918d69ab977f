use diesel::{Connection, SqliteConnection};
use serde::Serialize;

use crate::{
    errors::{AppError, AppResult},
    models::{
        feed::{Feed, NewFeed},
        feed_follow::NewFeedFollow,
        user::User,
    },
    security::validation,
};

/// Shown in place of the owner of a feed whose creator was deleted.
pub const UNKNOWN_OWNER: &str = "not found";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedListing {
    pub name: String,
    pub url: String,
    pub owner_name: String,
}

/// Register a new feed owned by `user` and subscribe them to it.
///
/// The feed and the follow are written in one transaction.
pub fn add_feed(conn: &mut SqliteConnection, user: &User, name: &str, url: &str) -> AppResult<Feed> {
    let name = name.trim();
    let url = url.trim();
    validation::validate_name(name).map_err(|e| AppError::invalid_input("name", &e))?;
    validation::validate_url(url).map_err(|e| AppError::invalid_input("url", &e))?;

    let feed = conn.transaction(|conn| {
        let feed = NewFeed::new(name, url, user).insert(conn)?;
        NewFeedFollow::new(user, &feed).insert(conn)?;
        Ok::<_, AppError>(feed)
    })?;

    tracing::info!(feed_id = %feed.id, url = %feed.url, user = %user.name, "Feed added");
    Ok(feed)
}

/// Every feed with its creator's name, for an administrative overview.
pub fn list_feeds(conn: &mut SqliteConnection) -> AppResult<Vec<FeedListing>> {
    Ok(Feed::get_all_with_owner(conn)?
        .into_iter()
        .map(|row| FeedListing {
            name: row.feed.name,
            url: row.feed.url,
            owner_name: row.owner_name.unwrap_or_else(|| UNKNOWN_OWNER.to_string()),
        })
        .collect())
}
