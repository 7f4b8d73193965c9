//! Signed access tokens for depot.
//!
//! Thin wrapper over HS256 JWTs. Claims carry the authenticated identity
//! that every pipeline entry point requires; owner ids are never taken
//! from client input.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::User;
use crate::{DepotError, Result};

/// JWT claims for an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user ID).
    pub sub: i64,
    /// Username.
    pub username: String,
    /// Whether the user can access the admin analytics surface.
    pub is_admin: bool,
    /// Issued at timestamp.
    pub iat: u64,
    /// Expiration timestamp.
    pub exp: u64,
    /// JWT ID (unique identifier).
    pub jti: String,
}

/// Issues and decodes access tokens for one signing secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: u64,
}

impl TokenCodec {
    /// Create a codec from a secret and token lifetime.
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs,
        }
    }

    /// Issue an access token for a user.
    pub fn issue(&self, user: &User) -> Result<String> {
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = AccessClaims {
            sub: user.id,
            username: user.username.clone(),
            is_admin: user.is_admin,
            iat: now,
            exp: now + self.ttl_secs,
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| DepotError::Auth(e.to_string()))
    }

    /// Decode and validate an access token.
    pub fn decode(&self, token: &str) -> Result<AccessClaims> {
        decode::<AccessClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("token validation failed: {}", e);
                DepotError::Auth("invalid or expired token".to_string())
            })
    }
}
