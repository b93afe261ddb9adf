//! Customer orders.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use mobile_order_core::{OrderId, OrderStatus, OwnerId, ProductId, ShopId};

/// Ordered products and their quantities, serialized as `{"<product_id>": qty}`.
pub type OrderItems = BTreeMap<ProductId, u32>;

/// An order placed by a customer at a shop.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub owner_id: OwnerId,
    pub shop_id: ShopId,
    pub customer_name: Option<String>,
    pub table_number: Option<String>,
    pub note: Option<String>,
    pub items: OrderItems,
    /// Sum of price times quantity at the moment the order was placed.
    #[serde(with = "rust_decimal::serde::str")]
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `PATCH /api/orders/{id}/status`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}
