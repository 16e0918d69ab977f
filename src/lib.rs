pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod observability;
pub mod schema;
pub mod security;
pub mod session;
pub mod tasks;
#[cfg(test)]
pub mod test_helpers;

// Type definitions
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection};
use diesel::sqlite::SqliteConnection;
use diesel::RunQueryDsl;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::errors::{AppError, AppResult};

pub type DbPool = r2d2::Pool<ConnectionManager<SqliteConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/migrations");

/// Milliseconds a connection waits on a locked database before giving up.
const BUSY_TIMEOUT_MS: u32 = 5000;

/// Per-connection pragmas. SQLite scopes both of these to the connection,
/// so every pooled connection has to set them.
#[derive(Debug, Clone, Copy)]
pub struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        configure_connection(conn).map_err(r2d2::Error::QueryError)
    }
}

pub fn configure_connection(conn: &mut SqliteConnection) -> diesel::QueryResult<()> {
    diesel::sql_query("PRAGMA foreign_keys = ON").execute(conn)?;
    diesel::sql_query(format!("PRAGMA busy_timeout = {BUSY_TIMEOUT_MS}")).execute(conn)?;
    Ok(())
}

pub fn initialize_db_pool(database_url: &str, max_size: u32) -> AppResult<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = r2d2::Pool::builder()
        .max_size(max_size)
        .connection_customizer(Box::new(SqlitePragmas))
        .build(manager)?;
    Ok(pool)
}

pub fn run_migrations(conn: &mut SqliteConnection) -> AppResult<()> {
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| AppError::Config(format!("failed to run migrations: {e}")))?;
    Ok(())
}

// Re-export test helpers for unit tests
#[cfg(test)]
pub use test_helpers::*;
