use diesel::SqliteConnection;

use crate::{
    errors::AppResult,
    models::{
        feed::Feed,
        feed_follow::{FeedFollow, NewFeedFollow},
        user::User,
    },
};

/// Subscribe `user` to the feed registered under `url`.
///
/// Fails with `NotFound` for an unknown URL and `DuplicateFollow` when the
/// user already follows the feed.
pub fn follow(conn: &mut SqliteConnection, user: &User, url: &str) -> AppResult<Feed> {
    let feed = Feed::require_by_url(conn, url.trim())?;
    NewFeedFollow::new(user, &feed).insert(conn)?;
    tracing::info!(feed_id = %feed.id, user = %user.name, "Feed followed");
    Ok(feed)
}

/// Remove `user`'s follow of the feed at `url`. Not following it is fine.
pub fn unfollow(conn: &mut SqliteConnection, user: &User, url: &str) -> AppResult<Feed> {
    let feed = Feed::require_by_url(conn, url.trim())?;
    let removed = FeedFollow::delete_for_user_and_feed(conn, &user.id, &feed.id)?;
    tracing::info!(feed_id = %feed.id, user = %user.name, removed, "Feed unfollowed");
    Ok(feed)
}

/// Names of the feeds `user` follows.
pub fn list_following(conn: &mut SqliteConnection, user: &User) -> AppResult<Vec<String>> {
    Ok(FeedFollow::feeds_for_user(conn, &user.id)?
        .into_iter()
        .map(|feed| feed.name)
        .collect())
}
