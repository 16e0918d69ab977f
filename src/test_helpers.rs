use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tempfile::TempDir;

use crate::{configure_connection, initialize_db_pool, run_migrations, DbPool};

/// Create a test database with a temporary file
pub fn create_test_db(max_size: u32) -> (TempDir, DbPool) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");

    let pool = initialize_db_pool(&db_path.display().to_string(), max_size)
        .expect("Failed to create pool");

    let mut conn = pool.get().expect("Failed to get connection");
    run_migrations(&mut conn).expect("Failed to run migrations");

    (temp_dir, pool)
}

/// Create an in-memory test database connection
pub fn get_test_db_connection() -> SqliteConnection {
    let mut conn = SqliteConnection::establish(":memory:")
        .unwrap_or_else(|_| panic!("Error connecting to in-memory SQLite database"));

    configure_connection(&mut conn).expect("Failed to configure connection");
    run_migrations(&mut conn).expect("Failed to run migrations");
    conn
}

/// Backdate a feed's fetch time. Fixtures only; production code goes
/// through `Feed::claim_next`.
pub fn set_last_fetched(conn: &mut SqliteConnection, feed_id: &str, at: NaiveDateTime) {
    use crate::schema::feeds::dsl::{feeds, last_fetched_at};
    diesel::update(feeds.find(feed_id))
        .set(last_fetched_at.eq(at))
        .execute(conn)
        .expect("Failed to set last_fetched_at");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::users;

    #[test]
    fn test_create_test_db() {
        let (_temp_dir, pool) = create_test_db(2);
        let mut conn = pool.get().expect("Failed to get connection");

        let user_count: i64 = users::table
            .count()
            .first(&mut conn)
            .expect("Failed to count users");
        assert_eq!(user_count, 0);
    }

    #[test]
    fn test_foreign_keys_enabled_on_pooled_connections() {
        #[derive(QueryableByName)]
        struct Pragma {
            #[diesel(sql_type = diesel::sql_types::Integer)]
            foreign_keys: i32,
        }

        let (_temp_dir, pool) = create_test_db(2);
        let mut conn = pool.get().expect("Failed to get connection");
        let pragma: Pragma = diesel::sql_query("PRAGMA foreign_keys")
            .get_result(&mut conn)
            .expect("Failed to read pragma");
        assert_eq!(pragma.foreign_keys, 1);
    }
}
