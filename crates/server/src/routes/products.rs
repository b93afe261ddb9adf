//! Menu products.

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use mobile_order_core::{CategoryId, ProductId};

use crate::db::ProductRepository;
use crate::error::AppError;
use crate::middleware::RequireOwner;
use crate::models::{Product, ProductInput};
use crate::services::MenuService;
use crate::state::AppState;
use crate::storage::ImageKind;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::not_found;
use super::upload::read_image;

/// Query for `GET /api/products`.
#[derive(Debug, Deserialize)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
}

/// List products in display order, optionally for a single category.
#[instrument(skip_all, fields(owner_id = %owner.id, category_id = ?filter.category_id))]
pub async fn index(
    RequireOwner(owner): RequireOwner,
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ProductFilter>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = MenuService::new(state.pool())
        .products(owner.id, filter.category_id)
        .await
        .map_err(not_found("Category"))?;
    Ok(Json(products))
}

/// Create a product at the end of its category.
#[instrument(skip_all, fields(owner_id = %owner.id))]
pub async fn create(
    RequireOwner(owner): RequireOwner,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ProductInput>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let input = body.validate()?;
    let product = ProductRepository::new(state.pool())
        .create(owner.id, &input)
        .await?;

    tracing::info!(product_id = %product.id, category_id = %product.category_id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// Get one product.
#[instrument(skip_all, fields(owner_id = %owner.id, product_id = %id))]
pub async fn show(
    RequireOwner(owner): RequireOwner,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>, AppError> {
    let product = ProductRepository::new(state.pool())
        .get(owner.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
    Ok(Json(product))
}

/// Replace a product's details.
#[instrument(skip_all, fields(owner_id = %owner.id, product_id = %id))]
pub async fn update(
    RequireOwner(owner): RequireOwner,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(body): ApiJson<ProductInput>,
) -> Result<Json<Product>, AppError> {
    let input = body.validate()?;
    let product = ProductRepository::new(state.pool())
        .update(owner.id, id, &input)
        .await
        .map_err(not_found("Product"))?;
    Ok(Json(product))
}

/// Delete a product and its image.
#[instrument(skip_all, fields(owner_id = %owner.id, product_id = %id))]
pub async fn destroy(
    RequireOwner(owner): RequireOwner,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<StatusCode, AppError> {
    let image = ProductRepository::new(state.pool())
        .delete(owner.id, id)
        .await
        .map_err(not_found("Product"))?;

    if let Some(key) = image {
        state.images().discard(&key).await;
    }

    tracing::info!("Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Replace a product's image.
#[instrument(skip_all, fields(owner_id = %owner.id, product_id = %id))]
pub async fn upload_image(
    RequireOwner(owner): RequireOwner,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Product>, AppError> {
    let upload = read_image(multipart).await?;
    let images = state.images();
    let key = images
        .save(owner.id, ImageKind::Product, &upload.content_type, &upload.bytes)
        .await?;

    match ProductRepository::new(state.pool())
        .set_image(owner.id, id, &key)
        .await
    {
        Ok((product, previous)) => {
            if let Some(previous) = previous {
                images.discard(&previous).await;
            }
            Ok(Json(product))
        }
        Err(e) => {
            images.discard(&key).await;
            Err(not_found("Product")(e))
        }
    }
}
