use diesel::SqliteConnection;

use crate::config::UserConfig;
use crate::errors::{AppError, AppResult};
use crate::models::user::User;

/// Resolve the logged-in user recorded in the user config.
///
/// Fails with `Unauthenticated` when nobody is logged in or the recorded
/// user no longer exists (e.g. after `reset`).
pub fn current_user(conn: &mut SqliteConnection, config: &UserConfig) -> AppResult<User> {
    let Some(name) = config.current_user_name.as_deref() else {
        return Err(AppError::Unauthenticated);
    };

    match User::get_by_name(conn, name)? {
        Some(user) => Ok(user),
        None => {
            tracing::warn!(user = name, "Configured user not found");
            Err(AppError::Unauthenticated)
        }
    }
}
