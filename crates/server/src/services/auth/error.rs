//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] mobile_order_core::EmailError),

    /// Wrong password or unknown email.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An owner with this email already exists.
    #[error("an account with this email already exists")]
    OwnerAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// No `Authorization: Bearer` header.
    #[error("missing bearer token")]
    MissingToken,

    /// Token does not have the expected shape.
    #[error("malformed bearer token")]
    MalformedToken,

    /// Token signature does not match.
    #[error("invalid bearer token")]
    InvalidSignature,

    /// Token is past its expiry.
    #[error("bearer token expired")]
    Expired,

    /// Signing key could not be used.
    #[error("token signing key rejected")]
    InvalidKey,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
