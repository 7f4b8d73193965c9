//! JWT authentication middleware for the depot Web API.

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::{AccessClaims, TokenCodec};
use crate::web::error::ApiError;

/// Shared JWT verification state injected into request extensions.
#[derive(Clone)]
pub struct JwtState {
    codec: TokenCodec,
}

impl JwtState {
    /// Create a new JWT state from the shared codec.
    pub fn new(codec: TokenCodec) -> Self {
        Self { codec }
    }

    /// Decode and validate a token.
    pub fn decode(&self, token: &str) -> Result<AccessClaims, ApiError> {
        self.codec.decode(token).map_err(ApiError::from)
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

fn claims_from_parts(parts: &mut Parts) -> Result<AccessClaims, ApiError> {
    let token =
        bearer_token(parts).ok_or_else(|| ApiError::unauthorized("Missing authorization"))?;

    let jwt_state = parts
        .extensions
        .get::<Arc<JwtState>>()
        .ok_or_else(|| ApiError::internal("JWT state not configured"))?;

    jwt_state.decode(&token)
}

/// Extractor for authenticated users.
///
/// The claims carry the authenticated identity; handlers thread it into
/// the service layer and never accept an owner id from the client.
#[derive(Debug, Clone)]
pub struct AuthUser(pub AccessClaims);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        claims_from_parts(parts).map(AuthUser)
    }
}

/// Extractor for administrators.
///
/// Same as [`AuthUser`] but rejects non-admin accounts with 403.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AccessClaims);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = claims_from_parts(parts)?;
        if !claims.is_admin {
            return Err(ApiError::forbidden("admin access required"));
        }
        Ok(AdminUser(claims))
    }
}

/// Middleware function to inject JWT state into request extensions.
pub async fn jwt_auth(jwt_state: Arc<JwtState>, mut request: Request<Body>, next: Next) -> Response {
    request.extensions_mut().insert(jwt_state);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::User;

    fn sample_user(is_admin: bool) -> User {
        User {
            id: 1,
            username: "tester".to_string(),
            email: "tester@example.com".to_string(),
            password: "hash".to_string(),
            is_admin,
            total_storage_used: 0.0,
            created_at: "2026-01-01 00:00:00".to_string(),
            last_login: None,
        }
    }

    #[test]
    fn test_jwt_state_roundtrip() {
        let codec = TokenCodec::new("test-secret", 3600);
        let token = codec.issue(&sample_user(false)).unwrap();

        let state = JwtState::new(codec);
        let claims = state.decode(&token).unwrap();
        assert_eq!(claims.sub, 1);
        assert!(!claims.is_admin);
    }

    #[test]
    fn test_jwt_state_rejects_garbage() {
        let state = JwtState::new(TokenCodec::new("test-secret", 3600));
        assert!(state.decode("garbage").is_err());
    }
}
