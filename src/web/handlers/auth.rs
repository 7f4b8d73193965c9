//! Auth handlers for the depot Web API.

use axum::{extract::State, Json};
use std::sync::Arc;
use validator::Validate;

use crate::auth::AuthService;
use crate::web::dto::{ApiResponse, AuthResponse, LoginRequest, RegisterRequest, UserInfo};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// POST /api/auth/register - Create an account and sign in.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    request
        .validate()
        .map_err(ApiError::from_validation_errors)?;

    let auth = AuthService::new(&state.db);
    let user = auth
        .register(&request.username, &request.email, &request.password)
        .await?;

    let access_token = state.tokens.issue(&user)?;

    Ok(Json(ApiResponse::new(AuthResponse {
        access_token,
        expires_in: state.token_ttl_secs,
        user: UserInfo::from(&user),
    })))
}

/// POST /api/auth/login - Verify credentials and issue a token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    request
        .validate()
        .map_err(ApiError::from_validation_errors)?;

    let auth = AuthService::new(&state.db);
    let user = auth.login(&request.email, &request.password).await?;

    let access_token = state.tokens.issue(&user)?;

    Ok(Json(ApiResponse::new(AuthResponse {
        access_token,
        expires_in: state.token_ttl_secs,
        user: UserInfo::from(&user),
    })))
}
