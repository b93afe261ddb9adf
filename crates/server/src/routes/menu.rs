//! Public shop menu.

use axum::{Json, extract::State};
use tracing::instrument;

use mobile_order_core::ShopId;

use crate::error::AppError;
use crate::services::{Menu, MenuService};
use crate::state::AppState;

use super::extract::ApiPath;
use super::not_found;

/// A shop's menu as customers see it: available products only, in the
/// owner's order.
#[instrument(skip_all, fields(shop_id = %shop_id))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(shop_id): ApiPath<ShopId>,
) -> Result<Json<Menu>, AppError> {
    let menu = MenuService::new(state.pool())
        .public_menu(shop_id)
        .await
        .map_err(not_found("Shop"))?;
    Ok(Json(menu))
}
