//! Request and response DTOs for the depot Web API.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::User;
use crate::file::StoredFile;

// ============================================================================
// Generic wrappers
// ============================================================================

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Offset/limit pagination query parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationQuery {
    /// Number of records to skip.
    #[serde(default)]
    pub offset: i64,
    /// Maximum number of records to return.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

impl PaginationQuery {
    /// Clamp the parameters to sane bounds.
    pub fn clamped(&self) -> (i64, i64) {
        (self.offset.max(0), self.limit.clamp(1, 100))
    }
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: default_limit(),
        }
    }
}

// ============================================================================
// Auth
// ============================================================================

/// Registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Desired username.
    #[validate(length(min = 3, max = 32, message = "username must be 3-32 characters"))]
    pub username: String,
    /// Email address.
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
}

/// Login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address.
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// User information in responses.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    /// User ID.
    pub id: i64,
    /// Username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Admin flag.
    pub is_admin: bool,
    /// Bytes currently stored.
    pub total_storage_used: f64,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            total_storage_used: user.total_storage_used,
        }
    }
}

/// Response for register and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Access token (JWT).
    pub access_token: String,
    /// Access token expiry in seconds.
    pub expires_in: u64,
    /// User information.
    pub user: UserInfo,
}

// ============================================================================
// Files
// ============================================================================

/// File information in responses.
///
/// Deliberately excludes the stored name and filesystem path; clients
/// only ever see the display name.
#[derive(Debug, Serialize)]
pub struct FileInfo {
    /// File ID.
    pub id: i64,
    /// Display name the file was uploaded under.
    pub name: String,
    /// Client-asserted content type.
    pub content_type: Option<String>,
    /// Size in bytes.
    pub size: f64,
    /// Upload timestamp (RFC 3339).
    pub uploaded_at: String,
}

impl From<&StoredFile> for FileInfo {
    fn from(file: &StoredFile) -> Self {
        Self {
            id: file.id,
            name: file.uploaded_name.clone(),
            content_type: file.content_type.clone(),
            size: file.size,
            uploaded_at: file.uploaded_at_datetime().to_rfc3339(),
        }
    }
}

// ============================================================================
// Analytics
// ============================================================================

/// Query parameter for upload statistics.
#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    /// Bucket size: daily, weekly or monthly.
    #[serde(default = "default_period")]
    pub period: String,
}

fn default_period() -> String {
    "daily".to_string()
}

/// Query parameter for top-users.
#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    /// Maximum number of records to return.
    #[serde(default = "default_top_limit")]
    pub limit: i64,
}

fn default_top_limit() -> i64 {
    10
}

/// Storage usage summary for one user (admin top-users view).
#[derive(Debug, Serialize)]
pub struct UserStorageInfo {
    /// User ID.
    pub id: i64,
    /// Username.
    pub username: String,
    /// Bytes currently stored.
    pub total_storage_used: f64,
}

impl From<&User> for UserStorageInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            total_storage_used: user.total_storage_used,
        }
    }
}

/// One event in the admin event log.
#[derive(Debug, Serialize)]
pub struct EventInfo {
    /// Event ID.
    pub id: i64,
    /// Acting user, if any.
    pub user_id: Option<i64>,
    /// Event tag.
    pub event_type: String,
    /// Timestamp (RFC 3339).
    pub timestamp: String,
    /// Structured payload.
    pub details: Option<serde_json::Value>,
}

impl From<&crate::analytics::AnalyticsEvent> for EventInfo {
    fn from(event: &crate::analytics::AnalyticsEvent) -> Self {
        Self {
            id: event.id,
            user_id: event.user_id,
            event_type: event.event_type.clone(),
            timestamp: event.timestamp_datetime().to_rfc3339(),
            details: event.details_json(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterRequest {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(valid.validate().is_ok());

        let bad_email = RegisterRequest {
            username: "alice".to_string(),
            email: "not-an-email".to_string(),
            password: "password123".to_string(),
        };
        assert!(bad_email.validate().is_err());

        let short_password = RegisterRequest {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "short".to_string(),
        };
        assert!(short_password.validate().is_err());

        let short_username = RegisterRequest {
            username: "ab".to_string(),
            email: "alice@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(short_username.validate().is_err());
    }

    #[test]
    fn test_pagination_clamping() {
        let query = PaginationQuery {
            offset: -5,
            limit: 10_000,
        };
        assert_eq!(query.clamped(), (0, 100));

        let query = PaginationQuery { offset: 20, limit: 0 };
        assert_eq!(query.clamped(), (20, 1));

        let query = PaginationQuery::default();
        assert_eq!(query.clamped(), (0, 50));
    }
}
