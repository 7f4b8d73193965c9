//! User repository for depot.

use sqlx::SqlitePool;

use super::user::{normalize_email, NewUser, User};
use crate::{DepotError, Result};

const USER_COLUMNS: &str =
    "id, username, email, password, is_admin, total_storage_used, created_at, last_login";

/// Repository for user records.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user.
    ///
    /// Fails with `DuplicateIdentity` if the username or the normalized
    /// email is already registered.
    pub async fn create(&self, user: &NewUser) -> Result<User> {
        let email = normalize_email(&user.email);

        let existing: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM users WHERE username = ? OR email = ?")
                .bind(&user.username)
                .bind(&email)
                .fetch_optional(self.pool)
                .await?;

        if existing.is_some() {
            return Err(DepotError::DuplicateIdentity(user.username.clone()));
        }

        let result = sqlx::query(
            "INSERT INTO users (username, email, password, is_admin) VALUES (?, ?, ?, ?)",
        )
        .bind(&user.username)
        .bind(&email)
        .bind(&user.password)
        .bind(user.is_admin)
        .execute(self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DepotError::NotFound("user".to_string()))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(user)
    }

    /// Get a user by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(normalize_email(email))
            .fetch_optional(self.pool)
            .await?;

        Ok(user)
    }

    /// Record a successful login.
    pub async fn touch_last_login(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = datetime('now') WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// List users ordered by storage used, descending.
    ///
    /// Ties are broken by user id ascending so the ordering is
    /// deterministic.
    pub async fn top_by_storage(&self, limit: i64) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users
             ORDER BY total_storage_used DESC, id ASC LIMIT ?"
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;

        Ok(users)
    }

    /// Delete a user by ID.
    ///
    /// Owned files and analytics events are removed by cascade.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
