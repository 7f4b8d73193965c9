//! Web API module for depot.
//!
//! A thin axum surface over the service layer: auth, file and analytics
//! endpoints, JWT middleware and typed JSON errors.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::{ApiError, ErrorCode};
pub use handlers::AppState;
pub use middleware::{AdminUser, AuthUser, JwtState};
pub use router::create_router;
