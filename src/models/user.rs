use crate::errors::{is_unique_violation, AppError, AppResult};
use crate::schema::*;
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, PartialEq)]
#[diesel(table_name = users)]
pub struct User {
    pub id: String,
    pub name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub id: String,
    pub name: &'a str,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl<'a> NewUser<'a> {
    pub fn new(name: &'a str) -> Self {
        let now = Utc::now().naive_utc();
        NewUser {
            id: Uuid::new_v4().to_string(),
            name,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn insert(&self, conn: &mut SqliteConnection) -> AppResult<User> {
        use crate::schema::users::dsl::users;
        diesel::insert_into(users)
            .values(self)
            .returning(User::as_returning())
            .get_result(conn)
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::DuplicateUser {
                        name: self.name.to_string(),
                    }
                } else {
                    e.into()
                }
            })
    }
}

impl User {
    #[cfg(test)]
    pub fn get_by_id(conn: &mut SqliteConnection, user_id: &str) -> AppResult<Option<User>> {
        use crate::schema::users::dsl::users;
        Ok(users
            .find(user_id)
            .select(User::as_select())
            .first(conn)
            .optional()?)
    }

    pub fn get_by_name(conn: &mut SqliteConnection, user_name: &str) -> AppResult<Option<User>> {
        use crate::schema::users::dsl::{name, users};
        Ok(users
            .filter(name.eq(user_name))
            .select(User::as_select())
            .first(conn)
            .optional()?)
    }

    pub fn get_all(conn: &mut SqliteConnection) -> AppResult<Vec<User>> {
        use crate::schema::users::dsl::{name, users};
        Ok(users.order(name.asc()).select(User::as_select()).load(conn)?)
    }

    pub fn touch(conn: &mut SqliteConnection, user_id: &str) -> AppResult<User> {
        use crate::schema::users::dsl::{updated_at, users};
        Ok(diesel::update(users.find(user_id))
            .set(updated_at.eq(Utc::now().naive_utc()))
            .returning(User::as_returning())
            .get_result(conn)?)
    }

    /// Deletes every user. Follows go with them; feeds lose their owner.
    pub fn delete_all(conn: &mut SqliteConnection) -> AppResult<usize> {
        use crate::schema::users::dsl::users;
        Ok(diesel::delete(users).execute(conn)?)
    }
}
