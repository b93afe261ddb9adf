//! Owner account management.
//!
//! Owners normally sign up through `POST /api/auth/signup`; this command is
//! for provisioning accounts when signup is not exposed.

use mobile_order_core::OwnerId;
use mobile_order_server::services::{AuthError, AuthService};
use thiserror::Error;

use super::{CommandError, connect};

/// Errors that can occur during owner operations.
#[derive(Debug, Error)]
pub enum OwnerError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Create a new owner account.
///
/// Applies the same email and password rules as signup.
///
/// # Errors
///
/// Returns an error if the email is invalid or taken, the password is too weak,
/// or the database is unreachable.
pub async fn create(email: &str, password: &str) -> Result<OwnerId, OwnerError> {
    let pool = connect().await?;

    let owner = AuthService::new(&pool).signup(email, password).await?;

    tracing::info!(owner_id = %owner.id, email = %owner.email, "Owner created");
    Ok(owner.id)
}
