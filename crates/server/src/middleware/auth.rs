//! Bearer token authentication for owner routes.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::models::CurrentOwner;
use crate::services::auth::{AuthError, parse_bearer};
use crate::state::AppState;

/// Extractor that requires a valid owner bearer token.
///
/// Rejects with 401 and a JSON error body when the `Authorization` header is
/// missing, malformed, badly signed or expired.
///
/// ```rust,ignore
/// async fn list_categories(
///     RequireOwner(owner): RequireOwner,
///     State(state): State<AppState>,
/// ) -> Result<Json<Vec<Category>>, AppError> {
///     let categories = CategoryRepository::new(state.pool()).list(owner.id).await?;
///     Ok(Json(categories))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequireOwner(pub CurrentOwner);

impl FromRequestParts<AppState> for RequireOwner {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingToken)?
            .to_str()
            .map_err(|_| AuthError::MalformedToken)?;

        let token = parse_bearer(header)?;
        let owner_id = state.tokens().verify(token)?;

        tracing::Span::current().record("owner_id", owner_id.as_i32());
        set_sentry_user(owner_id.as_i32());

        Ok(Self(CurrentOwner { id: owner_id }))
    }
}
