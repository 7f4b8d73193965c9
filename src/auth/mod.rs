//! Authentication module for depot.
//!
//! Credential hashing, signed access tokens, and the register/login
//! service.

mod password;
mod service;
mod token;

pub use password::{
    hash_password, verify_password, PasswordError, MAX_PASSWORD_BYTES, MIN_PASSWORD_LENGTH,
};
pub use service::AuthService;
pub use token::{AccessClaims, TokenCodec};
