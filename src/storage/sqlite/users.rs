//! `UserStore` for `SQLite`.

use super::rows::{USER_COLUMNS, ts, user_from_row};
use super::{SqliteStore, sql_err};
use crate::models::User;
use crate::storage::traits::UserStore;
use crate::{Error, Result};
use rusqlite::{ErrorCode, OptionalExtension, params};
use tracing::instrument;

impl UserStore for SqliteStore {
    #[instrument(skip(self, user), fields(operation = "insert_user", backend = "sqlite", user.id = %user.id))]
    fn insert_user(&self, user: &User) -> Result<()> {
        self.with_conn("insert_user", |conn| {
            conn.execute(
                "INSERT INTO users (id, email, name, password_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    user.id,
                    user.email,
                    user.name,
                    user.password_hash,
                    ts(&user.created_at)
                ],
            )
            .map_err(|e| match e.sqlite_error_code() {
                Some(ErrorCode::ConstraintViolation) => {
                    Error::InvalidInput("Email already registered".to_string())
                },
                _ => Error::failed("insert_user", e),
            })?;
            Ok(())
        })
    }

    #[instrument(skip(self), fields(operation = "get_user", backend = "sqlite"))]
    fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.with_conn("get_user", |conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                user_from_row,
            )
            .optional()
            .map_err(sql_err("get_user"))
        })
    }

    #[instrument(skip(self, email), fields(operation = "find_user_by_email", backend = "sqlite"))]
    fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.with_conn("find_user_by_email", |conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email],
                user_from_row,
            )
            .optional()
            .map_err(sql_err("find_user_by_email"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(id: &str, email: &str) -> User {
        User {
            id: id.to_string(),
            email: email.to_string(),
            name: "Tester".to_string(),
            password_hash: "hash".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_insert_and_get() {
        let store = SqliteStore::in_memory().unwrap();
        let u = user("u1", "a@example.com");
        store.insert_user(&u).unwrap();

        assert_eq!(store.get_user("u1").unwrap(), Some(u.clone()));
        assert_eq!(store.find_user_by_email("a@example.com").unwrap(), Some(u));
        assert!(store.get_user("missing").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let store = SqliteStore::in_memory().unwrap();
        store.insert_user(&user("u1", "a@example.com")).unwrap();

        let result = store.insert_user(&user("u2", "a@example.com"));
        assert!(matches!(result, Err(Error::InvalidInput(ref msg)) if msg == "Email already registered"));
    }
}
