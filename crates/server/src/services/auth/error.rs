//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::oauth::OAuthError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] solemart_core::EmailError),

    /// Invalid credentials (wrong password, unknown user, or OAuth-only user).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// OAuth `state` missing from the session or not matching the callback.
    #[error("invalid session state")]
    InvalidSessionState,

    /// OAuth provider error.
    #[error("oauth error: {0}")]
    OAuth(#[from] OAuthError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
