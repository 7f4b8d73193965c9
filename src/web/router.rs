//! Router configuration for the depot Web API.

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{analytics, auth, files, AppState};
use super::middleware::{jwt_auth, JwtState};

/// Overhead allowance for multipart framing on top of the upload ceiling.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// Create the CORS layer from configured origins (empty = allow any).
fn create_cors_layer(cors_origins: &[String]) -> CorsLayer {
    if cors_origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Create the main API router.
pub fn create_router(
    app_state: Arc<AppState>,
    jwt_state: Arc<JwtState>,
    cors_origins: &[String],
) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let file_routes = Router::new()
        .route("/", post(files::upload).get(files::list))
        .route("/:id", get(files::download).delete(files::delete));

    let analytics_routes = Router::new()
        .route("/me", get(analytics::my_stats))
        .route("/uploads", get(analytics::upload_stats))
        .route("/top-users", get(analytics::top_users))
        .route("/storage-by-type", get(analytics::storage_by_type))
        .route("/events", get(analytics::events));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/files", file_routes)
        .nest("/analytics", analytics_routes);

    let body_limit = app_state.files.policy().max_file_size() + MULTIPART_OVERHEAD;

    let jwt_state_for_middleware = jwt_state.clone();

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health_check))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(move |req, next| {
                    let state = jwt_state_for_middleware.clone();
                    jwt_auth(state, req, next)
                }))
                .layer(DefaultBodyLimit::max(body_limit as usize)),
        )
        .with_state(app_state)
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
