use super::{feed::Feed, user::User};
use crate::errors::{is_unique_violation, AppError, AppResult};
use crate::schema::*;
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(
    Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations, PartialEq,
)]
#[diesel(belongs_to(User))]
#[diesel(belongs_to(Feed))]
#[diesel(table_name = feed_follows)]
pub struct FeedFollow {
    pub id: String,
    pub user_id: String,
    pub feed_id: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = feed_follows)]
pub struct NewFeedFollow<'a> {
    pub id: String,
    pub user_id: &'a str,
    pub feed_id: &'a str,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl<'a> NewFeedFollow<'a> {
    pub fn new(user: &'a User, feed: &'a Feed) -> Self {
        let now = Utc::now().naive_utc();
        NewFeedFollow {
            id: Uuid::new_v4().to_string(),
            user_id: &user.id,
            feed_id: &feed.id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Inserts the follow. The UNIQUE (user_id, feed_id) index rejects a
    /// second follow of the same feed.
    pub fn insert(&self, conn: &mut SqliteConnection) -> AppResult<FeedFollow> {
        use crate::schema::feed_follows::dsl::feed_follows;
        diesel::insert_into(feed_follows)
            .values(self)
            .returning(FeedFollow::as_returning())
            .get_result(conn)
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::DuplicateFollow
                } else {
                    e.into()
                }
            })
    }
}

impl FeedFollow {
    #[cfg(test)]
    pub fn get_for_user_and_feed(
        conn: &mut SqliteConnection,
        user_id: &str,
        feed_id: &str,
    ) -> AppResult<Option<FeedFollow>> {
        use crate::schema::feed_follows::dsl::{
            feed_follows, feed_id as feed_id_col, user_id as user_id_col,
        };
        Ok(feed_follows
            .filter(user_id_col.eq(user_id))
            .filter(feed_id_col.eq(feed_id))
            .select(FeedFollow::as_select())
            .first(conn)
            .optional()?)
    }

    /// Feeds followed by a user, ordered by feed name.
    pub fn feeds_for_user(conn: &mut SqliteConnection, user_id: &str) -> AppResult<Vec<Feed>> {
        Ok(feed_follows::table
            .inner_join(feeds::table)
            .filter(feed_follows::user_id.eq(user_id))
            .order(feeds::name.asc())
            .select(Feed::as_select())
            .load(conn)?)
    }

    #[cfg(test)]
    pub fn count_for_user(conn: &mut SqliteConnection, user_id: &str) -> AppResult<i64> {
        use crate::schema::feed_follows::dsl::{feed_follows, user_id as user_id_col};
        Ok(feed_follows
            .filter(user_id_col.eq(user_id))
            .count()
            .get_result(conn)?)
    }

    /// Removes the follow if present. Returns whether a row was deleted.
    pub fn delete_for_user_and_feed(
        conn: &mut SqliteConnection,
        user_id: &str,
        feed_id: &str,
    ) -> AppResult<bool> {
        use crate::schema::feed_follows::dsl::{
            feed_follows, feed_id as feed_id_col, user_id as user_id_col,
        };
        let deleted = diesel::delete(
            feed_follows
                .filter(user_id_col.eq(user_id))
                .filter(feed_id_col.eq(feed_id)),
        )
        .execute(conn)?;
        Ok(deleted > 0)
    }
}
