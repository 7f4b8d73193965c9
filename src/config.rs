//! Configuration module for depot.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::{DepotError, Result};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/depot.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// File storage configuration.
///
/// The extension lists and size ceiling feed the immutable
/// [`UploadPolicy`](crate::file::UploadPolicy) built at startup; nothing
/// reads them from ambient global state.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the upload storage root.
    #[serde(default = "default_storage_root")]
    pub root: String,
    /// Maximum upload size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Extensions accepted for upload (lowercase, no dot).
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
    /// Extensions rejected even if also present in the allow list.
    #[serde(default = "default_blocked_extensions")]
    pub blocked_extensions: Vec<String>,
    /// Whether to verify file content signatures against the claimed
    /// extension (magic-byte sniffing).
    #[serde(default)]
    pub verify_content: bool,
}

fn default_storage_root() -> String {
    "data/uploads".to_string()
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

fn default_allowed_extensions() -> Vec<String> {
    [
        // Documents
        "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx",
        // Text
        "txt", "csv", "json", "xml",
        // Images
        "jpg", "jpeg", "png", "gif", "bmp", "webp",
        // Video
        "mp4", "avi", "mov", "wmv",
        // Audio
        "mp3", "wav", "ogg",
        // Archives
        "zip", "rar", "7z", "tar", "gz",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_blocked_extensions() -> Vec<String> {
    [
        // Executables
        "exe", "bat", "cmd", "sh", "ps1", "msi", "app", "deb", "rpm",
        // Scripts
        "jar", "vbs", "js", "wsf", "scr", "com", "pif",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            max_file_size: default_max_file_size(),
            allowed_extensions: default_allowed_extensions(),
            blocked_extensions: default_blocked_extensions(),
            verify_content: false,
        }
    }
}

impl StorageConfig {
    /// Allowed extensions as a lowercase lookup set.
    pub fn allowed_set(&self) -> HashSet<String> {
        self.allowed_extensions
            .iter()
            .map(|e| e.to_lowercase())
            .collect()
    }

    /// Blocked extensions as a lowercase lookup set.
    pub fn blocked_set(&self) -> HashSet<String> {
        self.blocked_extensions
            .iter()
            .map(|e| e.to_lowercase())
            .collect()
    }
}

/// Web API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// CORS allowed origins (empty = allow any).
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// JWT signing secret.
    #[serde(default)]
    pub jwt_secret: String,
    /// Access token expiry in seconds.
    #[serde(default = "default_jwt_expiry")]
    pub jwt_access_token_expiry_secs: u64,
}

fn default_jwt_expiry() -> u64 {
    1800 // 30 minutes
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            jwt_secret: String::new(),
            jwt_access_token_expiry_secs: default_jwt_expiry(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file (None = console only).
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Web API settings.
    #[serde(default)]
    pub web: WebConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Returns defaults if the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| DepotError::Config(e.to_string()))
    }

    /// Validate settings that have no usable default.
    pub fn validate(&self) -> Result<()> {
        if self.web.jwt_secret.is_empty() {
            return Err(DepotError::Config(
                "web.jwt_secret must be set".to_string(),
            ));
        }
        if self.storage.max_file_size == 0 {
            return Err(DepotError::Config(
                "storage.max_file_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
