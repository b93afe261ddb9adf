//! Order placement (public) and order processing (owner).

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use mobile_order_core::{OrderId, OrderStatus, ShopId};

use crate::db::OrderRepository;
use crate::error::AppError;
use crate::middleware::RequireOwner;
use crate::models::{Order, StatusUpdate};
use crate::services::{OrderService, PlaceOrderInput};
use crate::state::AppState;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::not_found;

/// Query for `GET /api/orders`.
#[derive(Debug, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
}

/// Place an order at a shop. No authentication.
#[instrument(skip_all, fields(shop_id = %shop_id))]
pub async fn place(
    State(state): State<AppState>,
    ApiPath(shop_id): ApiPath<ShopId>,
    ApiJson(body): ApiJson<PlaceOrderInput>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let order = OrderService::new(state.pool())
        .place(shop_id, body)
        .await
        .map_err(not_found("Shop"))?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// List the owner's orders, oldest first.
#[instrument(skip_all, fields(owner_id = %owner.id, status = ?filter.status))]
pub async fn index(
    RequireOwner(owner): RequireOwner,
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<OrderFilter>,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = OrderRepository::new(state.pool())
        .list(owner.id, filter.status)
        .await?;
    Ok(Json(orders))
}

/// Get one order.
#[instrument(skip_all, fields(owner_id = %owner.id, order_id = %id))]
pub async fn show(
    RequireOwner(owner): RequireOwner,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<Order>, AppError> {
    let order = OrderRepository::new(state.pool())
        .get(owner.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;
    Ok(Json(order))
}

/// Move an order forward: `new` to `served` or `past`, `served` to `past`.
#[instrument(skip_all, fields(owner_id = %owner.id, order_id = %id))]
pub async fn update_status(
    RequireOwner(owner): RequireOwner,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(body): ApiJson<StatusUpdate>,
) -> Result<Json<Order>, AppError> {
    let order = OrderRepository::new(state.pool())
        .update_status(owner.id, id, body.status)
        .await
        .map_err(not_found("Order"))?;
    Ok(Json(order))
}
