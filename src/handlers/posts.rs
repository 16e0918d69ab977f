use diesel::SqliteConnection;

use crate::{
    errors::{AppError, AppResult},
    models::{post::Post, user::User},
};

pub const DEFAULT_BROWSE_LIMIT: i64 = 2;

/// Latest posts from the feeds `user` follows.
pub fn browse(conn: &mut SqliteConnection, user: &User, limit: i64) -> AppResult<Vec<Post>> {
    if limit < 1 {
        return Err(AppError::invalid_input("limit", "must be at least 1"));
    }
    Post::for_user(conn, &user.id, limit)
}

/// Undo HTML entity escaping for terminal display.
pub fn unescape(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}
