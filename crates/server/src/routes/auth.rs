//! Owner signup, login and identity.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequireOwner;
use crate::models::Owner;
use crate::services::{AuthService, IssuedToken};
use crate::state::AppState;

use super::extract::ApiJson;

/// Body of signup and login requests.
#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Token issued on signup or login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub token: IssuedToken,
    pub owner: Owner,
}

/// Create an owner account and sign it in.
#[instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Credentials>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let owner = AuthService::new(state.pool())
        .signup(&body.email, &body.password)
        .await?;
    let token = state.tokens().issue(owner.id)?;

    Ok((StatusCode::CREATED, Json(AuthResponse { token, owner })))
}

/// Exchange email and password for a bearer token.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Credentials>,
) -> Result<Json<AuthResponse>, AppError> {
    let owner = AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await
        .inspect_err(|e| tracing::info!(error = %e, "Login failed"))?;
    let token = state.tokens().issue(owner.id)?;

    tracing::info!(owner_id = %owner.id, "Owner logged in");
    Ok(Json(AuthResponse { token, owner }))
}

/// The authenticated owner.
#[instrument(skip_all, fields(owner_id = %owner.id))]
pub async fn me(
    RequireOwner(owner): RequireOwner,
    State(state): State<AppState>,
) -> Result<Json<Owner>, AppError> {
    let owner = AuthService::new(state.pool()).get_owner(owner.id).await?;
    Ok(Json(owner))
}
