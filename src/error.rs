//! Error types for depot.

use thiserror::Error;

/// Common error type for depot.
#[derive(Error, Debug)]
pub enum DepotError {
    /// Upload was submitted without a filename.
    #[error("filename is required")]
    MissingFilename,

    /// File extension is missing, blocked, or not on the allow list.
    #[error("file type not allowed: {0}")]
    InvalidExtension(String),

    /// Payload exceeds the configured size ceiling.
    #[error("file size ({:.2} MiB) exceeds maximum allowed size ({:.2} MiB)",
        *size as f64 / 1048576.0, *limit as f64 / 1048576.0)]
    PayloadTooLarge {
        /// Measured payload size in bytes.
        size: u64,
        /// Configured ceiling in bytes.
        limit: u64,
    },

    /// File content contradicts its claimed extension.
    #[error("file content ({detected}) does not match extension .{expected}")]
    ContentMismatch {
        /// MIME type detected from the content.
        detected: String,
        /// Extension the client claimed.
        expected: String,
    },

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Ownership check failed.
    #[error("permission denied: {0}")]
    Forbidden(String),

    /// Username or email already registered.
    #[error("identity already registered: {0}")]
    DuplicateIdentity(String),

    /// Login failure. Deliberately identical for unknown email and wrong
    /// password so account existence cannot be probed.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Disk I/O fault while writing an uploaded object.
    #[error("storage write error: {0}")]
    StorageWrite(String),

    /// The storage counter went negative; internal fault, never user-facing.
    #[error("accounting invariant violated: {0}")]
    AccountingInvariant(String),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error (bad or expired token).
    #[error("authentication error: {0}")]
    Auth(String),

    /// Validation error for user input outside the upload pipeline.
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for DepotError {
    fn from(e: sqlx::Error) -> Self {
        DepotError::Database(e.to_string())
    }
}

/// Result type alias for depot operations.
pub type Result<T> = std::result::Result<T, DepotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = DepotError::NotFound("file".to_string());
        assert_eq!(err.to_string(), "file not found");
    }

    #[test]
    fn test_payload_too_large_display() {
        let err = DepotError::PayloadTooLarge {
            size: 11 * 1024 * 1024,
            limit: 10 * 1024 * 1024,
        };
        assert_eq!(
            err.to_string(),
            "file size (11.00 MiB) exceeds maximum allowed size (10.00 MiB)"
        );
    }

    #[test]
    fn test_invalid_credentials_is_uniform() {
        // Same message regardless of which check failed.
        assert_eq!(
            DepotError::InvalidCredentials.to_string(),
            "invalid email or password"
        );
    }

    #[test]
    fn test_content_mismatch_display() {
        let err = DepotError::ContentMismatch {
            detected: "application/x-msdownload".to_string(),
            expected: "pdf".to_string(),
        };
        assert!(err.to_string().contains("application/x-msdownload"));
        assert!(err.to_string().contains(".pdf"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: DepotError = io_err.into();
        assert!(matches!(err, DepotError::Io(_)));
    }

    #[test]
    fn test_result_alias() {
        fn sample() -> Result<i32> {
            Ok(7)
        }
        assert_eq!(sample().unwrap(), 7);
    }
}
