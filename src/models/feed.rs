use crate::errors::{is_unique_violation, AppError, AppResult};
use crate::schema::*;
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::User;

#[derive(
    Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations, PartialEq,
)]
#[diesel(belongs_to(User))]
#[diesel(table_name = feeds)]
pub struct Feed {
    pub id: String,
    pub name: String,
    pub url: String,
    /// creator of the feed; NULL once that user is deleted
    pub user_id: Option<String>,
    /// NULL if never fetched
    pub last_fetched_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = feeds)]
pub struct NewFeed<'a> {
    pub id: String,
    pub name: &'a str,
    pub url: &'a str,
    pub user_id: Option<&'a str>,
    pub last_fetched_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A feed joined with the display name of the user who registered it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FeedWithOwner {
    pub feed: Feed,
    pub owner_name: Option<String>,
}

impl<'a> NewFeed<'a> {
    pub fn new(name: &'a str, url: &'a str, owner: &'a User) -> Self {
        let now = Utc::now().naive_utc();
        NewFeed {
            id: Uuid::new_v4().to_string(),
            name,
            url,
            user_id: Some(&owner.id),
            last_fetched_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn insert(&self, conn: &mut SqliteConnection) -> AppResult<Feed> {
        use crate::schema::feeds::dsl::feeds;
        diesel::insert_into(feeds)
            .values(self)
            .returning(Feed::as_returning())
            .get_result(conn)
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::DuplicateUrl {
                        url: self.url.to_string(),
                    }
                } else {
                    e.into()
                }
            })
    }
}

impl Feed {
    #[cfg(test)]
    pub fn get_by_id(conn: &mut SqliteConnection, feed_id: &str) -> AppResult<Option<Feed>> {
        use crate::schema::feeds::dsl::feeds;
        Ok(feeds
            .find(feed_id)
            .select(Feed::as_select())
            .first(conn)
            .optional()?)
    }

    pub fn get_by_url(conn: &mut SqliteConnection, feed_url: &str) -> AppResult<Option<Feed>> {
        use crate::schema::feeds::dsl::{feeds, url};
        Ok(feeds
            .filter(url.eq(feed_url))
            .select(Feed::as_select())
            .first(conn)
            .optional()?)
    }

    /// Like [`Feed::get_by_url`], but a missing feed is an error.
    pub fn require_by_url(conn: &mut SqliteConnection, feed_url: &str) -> AppResult<Feed> {
        Feed::get_by_url(conn, feed_url)?
            .ok_or_else(|| AppError::resource_not_found(&format!("feed with url '{feed_url}'")))
    }

    pub fn get_all_with_owner(conn: &mut SqliteConnection) -> AppResult<Vec<FeedWithOwner>> {
        let rows: Vec<(Feed, Option<String>)> = feeds::table
            .left_join(users::table)
            .order(feeds::created_at.asc())
            .select((Feed::as_select(), users::name.nullable()))
            .load(conn)?;

        Ok(rows
            .into_iter()
            .map(|(feed, owner_name)| FeedWithOwner { feed, owner_name })
            .collect())
    }

    /// Claims the most overdue feed and stamps it as fetched.
    ///
    /// Candidates are feeds never fetched, or last fetched strictly before
    /// `due_before`. Never-fetched feeds win, then the oldest
    /// `last_fetched_at`. The read and the stamp run in one `IMMEDIATE`
    /// transaction, so the write lock is held before the candidate is
    /// chosen and no other connection can claim the same feed.
    ///
    /// This is the only writer of `last_fetched_at`.
    pub fn claim_next(conn: &mut SqliteConnection, due_before: NaiveDateTime) -> AppResult<Feed> {
        use crate::schema::feeds::dsl::{created_at, feeds, id, last_fetched_at, updated_at};

        conn.immediate_transaction(|conn| {
            // SQLite sorts NULL before any value in ascending order.
            let candidate = feeds
                .filter(last_fetched_at.is_null().or(last_fetched_at.lt(due_before)))
                .order((last_fetched_at.asc(), created_at.asc(), id.asc()))
                .select(Feed::as_select())
                .first(conn)
                .optional()?;

            let Some(candidate) = candidate else {
                return Err(AppError::resource_not_found("feed due for fetching"));
            };

            let now = Utc::now().naive_utc();
            let stamp = match candidate.last_fetched_at {
                Some(previous) if previous > now => previous,
                _ => now,
            };

            let claimed = diesel::update(feeds.find(&candidate.id))
                .set((last_fetched_at.eq(stamp), updated_at.eq(now)))
                .returning(Feed::as_returning())
                .get_result(conn)?;

            Ok(claimed)
        })
    }

    #[cfg(test)]
    pub fn delete(conn: &mut SqliteConnection, feed_id: &str) -> AppResult<bool> {
        use crate::schema::feeds::dsl::feeds;
        let deleted = diesel::delete(feeds.find(feed_id)).execute(conn)?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::NewUser;
    use crate::test_helpers::{get_test_db_connection, set_last_fetched};
    use chrono::Duration;

    fn owner(conn: &mut SqliteConnection) -> User {
        NewUser::new("owner").insert(conn).unwrap()
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut conn = get_test_db_connection();
        let user = owner(&mut conn);
        let feed = NewFeed::new("HN", "https://news.ycombinator.com/rss", &user)
            .insert(&mut conn)
            .unwrap();

        assert_eq!(feed.last_fetched_at, None);
        assert_eq!(feed.user_id.as_deref(), Some(user.id.as_str()));
        assert_eq!(
            Feed::get_by_url(&mut conn, "https://news.ycombinator.com/rss").unwrap(),
            Some(feed.clone())
        );
        assert_eq!(Feed::get_by_id(&mut conn, &feed.id).unwrap(), Some(feed));
    }

    #[test]
    fn test_duplicate_url_rejected() {
        let mut conn = get_test_db_connection();
        let user = owner(&mut conn);
        NewFeed::new("a", "https://example.com/rss", &user)
            .insert(&mut conn)
            .unwrap();

        let err = NewFeed::new("b", "https://example.com/rss", &user)
            .insert(&mut conn)
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateUrl { .. }));
    }

    #[test]
    fn test_require_by_url_missing() {
        let mut conn = get_test_db_connection();
        let err = Feed::require_by_url(&mut conn, "https://nope.example").unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[test]
    fn test_claim_on_empty_table_is_not_found() {
        let mut conn = get_test_db_connection();
        let err = Feed::claim_next(&mut conn, Utc::now().naive_utc()).unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[test]
    fn test_claim_order_nulls_first_then_oldest() {
        let mut conn = get_test_db_connection();
        let user = owner(&mut conn);
        let now = Utc::now().naive_utc();

        let newer = NewFeed::new("t2", "https://t2.example/rss", &user)
            .insert(&mut conn)
            .unwrap();
        let older = NewFeed::new("t1", "https://t1.example/rss", &user)
            .insert(&mut conn)
            .unwrap();
        let never = NewFeed::new("null", "https://null.example/rss", &user)
            .insert(&mut conn)
            .unwrap();
        set_last_fetched(&mut conn, &newer.id, now - Duration::hours(1));
        set_last_fetched(&mut conn, &older.id, now - Duration::hours(2));

        let due_before = Utc::now().naive_utc();
        let claimed: Vec<String> = (0..3)
            .map(|_| Feed::claim_next(&mut conn, due_before).unwrap().id)
            .collect();
        assert_eq!(claimed, vec![never.id, older.id, newer.id]);

        // Every feed was stamped after `due_before`, so the round is over.
        let err = Feed::claim_next(&mut conn, due_before).unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[test]
    fn test_claim_stamps_last_fetched() {
        let mut conn = get_test_db_connection();
        let user = owner(&mut conn);
        let feed = NewFeed::new("a", "https://a.example/rss", &user)
            .insert(&mut conn)
            .unwrap();

        let before = Utc::now().naive_utc();
        let claimed = Feed::claim_next(&mut conn, before).unwrap();
        assert_eq!(claimed.id, feed.id);
        assert!(claimed.last_fetched_at.unwrap() >= before);

        let stored = Feed::get_by_id(&mut conn, &feed.id).unwrap().unwrap();
        assert_eq!(stored.last_fetched_at, claimed.last_fetched_at);
    }

    #[test]
    fn test_claim_never_moves_last_fetched_backwards() {
        let mut conn = get_test_db_connection();
        let user = owner(&mut conn);
        let feed = NewFeed::new("a", "https://a.example/rss", &user)
            .insert(&mut conn)
            .unwrap();
        let future = Utc::now().naive_utc() + Duration::hours(1);
        set_last_fetched(&mut conn, &feed.id, future);

        let claimed = Feed::claim_next(&mut conn, future + Duration::seconds(1)).unwrap();
        assert_eq!(claimed.last_fetched_at, Some(future));
    }

    #[test]
    fn test_deleting_owner_keeps_feed() {
        let mut conn = get_test_db_connection();
        let user = owner(&mut conn);
        let feed = NewFeed::new("a", "https://a.example/rss", &user)
            .insert(&mut conn)
            .unwrap();

        User::delete_all(&mut conn).unwrap();

        let listed = Feed::get_all_with_owner(&mut conn).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].feed.id, feed.id);
        assert_eq!(listed[0].feed.user_id, None);
        assert_eq!(listed[0].owner_name, None);
    }
}
