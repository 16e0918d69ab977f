use diesel::SqliteConnection;

use crate::{
    errors::{AppError, AppResult},
    models::user::{NewUser, User},
    security::validation,
};

pub fn register(conn: &mut SqliteConnection, name: &str) -> AppResult<User> {
    let name = name.trim();
    validation::validate_name(name).map_err(|e| AppError::invalid_input("name", &e))?;

    let user = NewUser::new(name).insert(conn)?;
    tracing::info!(user_id = %user.id, name = %user.name, "User registered");
    Ok(user)
}

/// Look up the user that is about to become the current user.
pub fn login(conn: &mut SqliteConnection, name: &str) -> AppResult<User> {
    let user = User::get_by_name(conn, name.trim())?
        .ok_or_else(|| AppError::resource_not_found(&format!("user '{}'", name.trim())))?;
    User::touch(conn, &user.id)
}

/// Delete every user, along with their follows.
pub fn reset(conn: &mut SqliteConnection) -> AppResult<usize> {
    let deleted = User::delete_all(conn)?;
    tracing::info!(deleted, "Users reset");
    Ok(deleted)
}

pub fn list_users(conn: &mut SqliteConnection) -> AppResult<Vec<User>> {
    User::get_all(conn)
}
