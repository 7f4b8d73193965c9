//! User model for depot.

use chrono::{DateTime, Utc};

/// Normalize an email address for storage and lookup.
///
/// Comparison of emails is case-insensitive, so they are trimmed and
/// lower-cased before they ever reach the database.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// User entity representing a registered account.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: i64,
    /// Login username (unique).
    pub username: String,
    /// Email address (unique, case-normalized).
    pub email: String,
    /// Password hash (Argon2).
    pub password: String,
    /// Whether this account can access the admin analytics surface.
    pub is_admin: bool,
    /// Running total of bytes currently stored by this user.
    pub total_storage_used: f64,
    /// Account creation timestamp.
    pub created_at: String,
    /// Last login timestamp (None until first login).
    pub last_login: Option<String>,
}

impl User {
    /// Get the created_at as DateTime<Utc>.
    pub fn created_at_datetime(&self) -> DateTime<Utc> {
        parse_sqlite_datetime(&self.created_at)
    }

    /// Get the last_login as DateTime<Utc>, if any.
    pub fn last_login_datetime(&self) -> Option<DateTime<Utc>> {
        self.last_login.as_deref().map(parse_sqlite_datetime)
    }
}

/// Parse a SQLite `datetime('now')` string ("YYYY-MM-DD HH:MM:SS") as UTC.
pub(crate) fn parse_sqlite_datetime(s: &str) -> DateTime<Utc> {
    let normalized = s.replace(' ', "T");
    DateTime::parse_from_rfc3339(&format!("{normalized}Z"))
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login username.
    pub username: String,
    /// Email address (normalized on insert).
    pub email: String,
    /// Password hash (should be pre-hashed with Argon2).
    pub password: String,
    /// Admin flag (defaults to false).
    pub is_admin: bool,
}

impl NewUser {
    /// Create a new user with the required fields.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            is_admin: false,
        }
    }

    /// Mark the user as an administrator.
    pub fn with_admin(mut self) -> Self {
        self.is_admin = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("User@Example.COM"), "user@example.com");
        assert_eq!(normalize_email("  a@b.c  "), "a@b.c");
        assert_eq!(normalize_email("plain@example.com"), "plain@example.com");
    }

    #[test]
    fn test_new_user_builder() {
        let user = NewUser::new("alice", "alice@example.com", "hash");
        assert_eq!(user.username, "alice");
        assert!(!user.is_admin);

        let admin = NewUser::new("root", "root@example.com", "hash").with_admin();
        assert!(admin.is_admin);
    }

    #[test]
    fn test_parse_sqlite_datetime() {
        let dt = parse_sqlite_datetime("2026-08-06 12:30:00");
        assert_eq!(dt.to_rfc3339(), "2026-08-06T12:30:00+00:00");
    }

    #[test]
    fn test_last_login_datetime() {
        let user = User {
            id: 1,
            username: "test".to_string(),
            email: "test@example.com".to_string(),
            password: "hash".to_string(),
            is_admin: false,
            total_storage_used: 0.0,
            created_at: "2026-01-01 00:00:00".to_string(),
            last_login: None,
        };
        assert!(user.last_login_datetime().is_none());

        let logged_in = User {
            last_login: Some("2026-08-06 09:00:00".to_string()),
            ..user
        };
        assert!(logged_in.last_login_datetime().is_some());
    }
}
