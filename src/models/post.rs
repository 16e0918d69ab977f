use super::feed::Feed;
use crate::errors::AppResult;
use crate::schema::*;
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(
    Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations, PartialEq,
)]
#[diesel(belongs_to(Feed))]
#[diesel(table_name = posts)]
pub struct Post {
    pub id: String,
    pub feed_id: String,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    /// NULL when the source date could not be parsed
    pub published_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = posts)]
pub struct NewPost<'a> {
    pub id: String,
    pub feed_id: &'a str,
    pub title: &'a str,
    pub url: &'a str,
    pub description: Option<&'a str>,
    pub published_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl<'a> NewPost<'a> {
    pub fn new(feed_id: &'a str, title: &'a str, url: &'a str) -> Self {
        let now = Utc::now().naive_utc();
        NewPost {
            id: Uuid::new_v4().to_string(),
            feed_id,
            title,
            url,
            description: None,
            published_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Inserts the post unless one with the same (feed_id, url) exists.
    ///
    /// Returns `Ok(true)` when a row was written, `Ok(false)` when the post
    /// was already stored. Existing posts are never overwritten.
    pub fn insert_if_not_present(&self, conn: &mut SqliteConnection) -> AppResult<bool> {
        use crate::schema::posts::dsl::{feed_id, posts, url};
        let inserted = diesel::insert_into(posts)
            .values(self)
            .on_conflict((feed_id, url))
            .do_nothing()
            .execute(conn)?;
        Ok(inserted > 0)
    }
}

impl Post {
    #[cfg(test)]
    pub fn get_by_feed(conn: &mut SqliteConnection, feed: &str) -> AppResult<Vec<Post>> {
        use crate::schema::posts::dsl::{created_at, feed_id, posts};
        Ok(posts
            .filter(feed_id.eq(feed))
            .order(created_at.asc())
            .select(Post::as_select())
            .load(conn)?)
    }

    #[cfg(test)]
    pub fn get_by_feed_and_url(
        conn: &mut SqliteConnection,
        feed: &str,
        link: &str,
    ) -> AppResult<Option<Post>> {
        use crate::schema::posts::dsl::{feed_id, posts, url};
        Ok(posts
            .filter(feed_id.eq(feed))
            .filter(url.eq(link))
            .select(Post::as_select())
            .first(conn)
            .optional()?)
    }

    /// Posts from the feeds a user follows, newest first.
    ///
    /// Undated posts sort after dated ones.
    pub fn for_user(conn: &mut SqliteConnection, user_id: &str, limit: i64) -> AppResult<Vec<Post>> {
        Ok(posts::table
            .inner_join(feed_follows::table.on(feed_follows::feed_id.eq(posts::feed_id)))
            .filter(feed_follows::user_id.eq(user_id))
            .order((
                posts::published_at.is_null().asc(),
                posts::published_at.desc(),
                posts::created_at.desc(),
            ))
            .limit(limit)
            .select(Post::as_select())
            .load(conn)?)
    }
}
