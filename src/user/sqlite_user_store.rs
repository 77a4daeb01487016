use super::user_models::{User, UserId};
use super::user_store::UserStore;
use crate::catalog_store::{timestamp_to_datetime, SharedConnection, USERS_TABLE};
use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};

const USER_COLUMNS: &str = "id, email, username, password_hash, created";

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get::<_, i64>(0)? as UserId,
        email: row.get(1)?,
        username: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: timestamp_to_datetime(row.get(4)?),
    })
}

/// Users live in the catalog database, so the store shares its connection.
#[derive(Clone)]
pub struct SqliteUserStore {
    conn: SharedConnection,
}

impl SqliteUserStore {
    pub fn from_connection(conn: SharedConnection) -> Self {
        SqliteUserStore { conn }
    }

    fn query_one(&self, condition: &str, params: impl rusqlite::Params) -> Result<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let user = conn
            .query_row(
                &format!(
                    "SELECT {} FROM {} WHERE {}",
                    USER_COLUMNS, USERS_TABLE.name, condition
                ),
                params,
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }
}

impl UserStore for SqliteUserStore {
    fn create_user(&self, email: &str, username: &str, password_hash: &str) -> Result<UserId> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {} (email, username, password_hash) VALUES (?1, ?2, ?3)",
                USERS_TABLE.name
            ),
            params![email, username, password_hash],
        )
        .with_context(|| format!("Failed to create user {}", username))?;
        Ok(conn.last_insert_rowid() as UserId)
    }

    fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.query_one("id = ?1", params![id as i64])
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.query_one("email = ?1", params![email])
    }

    fn find_by_email_or_username(&self, email: &str, username: &str) -> Result<Option<User>> {
        self.query_one("email = ?1 OR username = ?2 LIMIT 1", params![email, username])
    }
}
