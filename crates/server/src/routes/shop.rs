//! The owner's shop profile.

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
};
use tracing::instrument;

use crate::db::ShopRepository;
use crate::error::AppError;
use crate::middleware::RequireOwner;
use crate::models::{Shop, ShopInput};
use crate::state::AppState;
use crate::storage::ImageKind;

use super::extract::ApiJson;
use super::not_found;
use super::upload::read_image;

/// Get the owner's shop.
#[instrument(skip_all, fields(owner_id = %owner.id))]
pub async fn show(
    RequireOwner(owner): RequireOwner,
    State(state): State<AppState>,
) -> Result<Json<Shop>, AppError> {
    let shop = ShopRepository::new(state.pool())
        .get_by_owner(owner.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Shop".to_string()))?;
    Ok(Json(shop))
}

/// Create or update the owner's shop.
#[instrument(skip_all, fields(owner_id = %owner.id))]
pub async fn upsert(
    RequireOwner(owner): RequireOwner,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ShopInput>,
) -> Result<Json<Shop>, AppError> {
    let input = body.validate()?;
    let shop = ShopRepository::new(state.pool())
        .upsert(owner.id, &input)
        .await?;

    tracing::info!(shop_id = %shop.id, "Shop saved");
    Ok(Json(shop))
}

/// Replace the shop image.
#[instrument(skip_all, fields(owner_id = %owner.id))]
pub async fn upload_image(
    RequireOwner(owner): RequireOwner,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Shop>, AppError> {
    let upload = read_image(multipart).await?;
    let images = state.images();
    let key = images
        .save(owner.id, ImageKind::Shop, &upload.content_type, &upload.bytes)
        .await?;

    match ShopRepository::new(state.pool()).set_image(owner.id, &key).await {
        Ok((shop, previous)) => {
            if let Some(previous) = previous {
                images.discard(&previous).await;
            }
            Ok(Json(shop))
        }
        Err(e) => {
            images.discard(&key).await;
            Err(not_found("Shop")(e))
        }
    }
}
