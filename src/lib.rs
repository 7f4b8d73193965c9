//! depot - multi-tenant file storage service
//!
//! Users authenticate, upload/download/delete files under a per-user
//! storage quota counter, and an admin surface aggregates usage
//! analytics. Single-node, single-database deployment.

pub mod analytics;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use analytics::AnalyticsService;
pub use auth::AuthService;
pub use config::Config;
pub use db::{Database, NewUser, User, UserRepository};
pub use error::{DepotError, Result};
pub use file::{FileService, FileStorage, UploadPolicy};
