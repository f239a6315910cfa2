//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] tribal_market_core::EmailError),

    /// Invalid credentials (wrong password, unknown user or no password set).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Display name missing or too long.
    #[error("name must be between 1 and {max} characters")]
    InvalidName { max: usize },

    /// Token missing, malformed, badly signed or expired.
    #[error("invalid or expired token")]
    InvalidToken,

    /// Token could not be signed.
    #[error("token creation failed: {0}")]
    TokenCreation(#[source] jsonwebtoken::errors::Error),

    /// The Google account's email address is not verified.
    #[error("google account email is not verified")]
    UnverifiedEmail,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
