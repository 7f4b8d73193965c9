//! API handlers for the depot Web API.

pub mod analytics;
pub mod auth;
pub mod files;

use crate::auth::TokenCodec;
use crate::db::Database;
use crate::file::FileService;

/// Shared application state for handlers.
pub struct AppState {
    /// Database handle.
    pub db: Database,
    /// File service (upload/download/delete pipelines).
    pub files: FileService,
    /// Token codec for issuing access tokens.
    pub tokens: TokenCodec,
    /// Access token lifetime in seconds, echoed in auth responses.
    pub token_ttl_secs: u64,
}

impl AppState {
    /// Create the shared state.
    pub fn new(db: Database, files: FileService, tokens: TokenCodec, token_ttl_secs: u64) -> Self {
        Self {
            db,
            files,
            tokens,
            token_ttl_secs,
        }
    }
}
