//! Menu categories and the sequences that order them.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use mobile_order_core::{CategoryId, ProductId};

use crate::db::{CategoryRepository, ProductRepository};
use crate::error::AppError;
use crate::middleware::RequireOwner;
use crate::models::{Category, CategoryInput, SequenceBody};
use crate::state::AppState;

use super::extract::{ApiJson, ApiPath};
use super::not_found;

/// List categories in sequence order.
#[instrument(skip_all, fields(owner_id = %owner.id))]
pub async fn index(
    RequireOwner(owner): RequireOwner,
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, AppError> {
    let categories = CategoryRepository::new(state.pool()).list(owner.id).await?;
    Ok(Json(categories))
}

/// Create a category at the end of the sequence.
#[instrument(skip_all, fields(owner_id = %owner.id))]
pub async fn create(
    RequireOwner(owner): RequireOwner,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CategoryInput>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let input = body.validate()?;
    let category = CategoryRepository::new(state.pool())
        .create(owner.id, &input.name)
        .await?;

    tracing::info!(category_id = %category.id, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// Get one category.
#[instrument(skip_all, fields(owner_id = %owner.id, category_id = %id))]
pub async fn show(
    RequireOwner(owner): RequireOwner,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<Json<Category>, AppError> {
    let category = CategoryRepository::new(state.pool())
        .get(owner.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category".to_string()))?;
    Ok(Json(category))
}

/// Rename a category.
#[instrument(skip_all, fields(owner_id = %owner.id, category_id = %id))]
pub async fn update(
    RequireOwner(owner): RequireOwner,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CategoryId>,
    ApiJson(body): ApiJson<CategoryInput>,
) -> Result<Json<Category>, AppError> {
    let input = body.validate()?;
    let category = CategoryRepository::new(state.pool())
        .rename(owner.id, id, &input.name)
        .await
        .map_err(not_found("Category"))?;
    Ok(Json(category))
}

/// Delete a category and all of its products.
#[instrument(skip_all, fields(owner_id = %owner.id, category_id = %id))]
pub async fn destroy(
    RequireOwner(owner): RequireOwner,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<StatusCode, AppError> {
    let images = CategoryRepository::new(state.pool())
        .delete(owner.id, id)
        .await
        .map_err(not_found("Category"))?;

    for key in &images {
        state.images().discard(key).await;
    }

    tracing::info!(removed_images = images.len(), "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Current category order.
#[instrument(skip_all, fields(owner_id = %owner.id))]
pub async fn sequence(
    RequireOwner(owner): RequireOwner,
    State(state): State<AppState>,
) -> Result<Json<SequenceBody<CategoryId>>, AppError> {
    let sequence = CategoryRepository::new(state.pool())
        .sequence(owner.id)
        .await?;
    Ok(Json(sequence.into()))
}

/// Replace the category order. The body must list every category once.
#[instrument(skip_all, fields(owner_id = %owner.id))]
pub async fn update_sequence(
    RequireOwner(owner): RequireOwner,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SequenceBody<CategoryId>>,
) -> Result<Json<SequenceBody<CategoryId>>, AppError> {
    CategoryRepository::new(state.pool())
        .set_sequence(owner.id, &body.sequence)
        .await?;
    Ok(Json(body))
}

/// Current product order within a category.
#[instrument(skip_all, fields(owner_id = %owner.id, category_id = %id))]
pub async fn product_sequence(
    RequireOwner(owner): RequireOwner,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<Json<SequenceBody<ProductId>>, AppError> {
    if CategoryRepository::new(state.pool())
        .get(owner.id, id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound("Category".to_string()));
    }

    let sequence = ProductRepository::new(state.pool())
        .sequence(owner.id, id)
        .await?;
    Ok(Json(sequence.into()))
}

/// Replace the product order within a category.
#[instrument(skip_all, fields(owner_id = %owner.id, category_id = %id))]
pub async fn update_product_sequence(
    RequireOwner(owner): RequireOwner,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CategoryId>,
    ApiJson(body): ApiJson<SequenceBody<ProductId>>,
) -> Result<Json<SequenceBody<ProductId>>, AppError> {
    ProductRepository::new(state.pool())
        .set_sequence(owner.id, id, &body.sequence)
        .await
        .map_err(not_found("Category"))?;
    Ok(Json(body))
}
