//! Order placement.
//!
//! Customers order from a shop's public menu. The total is computed here from
//! current product prices; whatever the client believes the prices are is
//! ignored.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;

use mobile_order_core::{Price, ProductId, ShopId};

use crate::db::orders::NewOrder;
use crate::db::{OrderRepository, ProductRepository, RepositoryError, ShopRepository};
use crate::models::{Order, OrderItems, ValidationError, optional_text};

/// Largest quantity of a single product in one order.
pub const MAX_QUANTITY: u32 = 99;

/// Largest number of distinct products in one order.
pub const MAX_LINE_ITEMS: usize = 100;

/// Body of `POST /api/shops/{shop_id}/orders`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrderInput {
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub table_number: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    pub items: OrderItems,
}

impl PlaceOrderInput {
    /// Check item counts and trim the free-text fields.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` describing the first problem.
    pub fn validate(self) -> Result<Self, ValidationError> {
        if self.items.is_empty() {
            return Err(ValidationError(
                "order must contain at least one item".to_string(),
            ));
        }
        if self.items.len() > MAX_LINE_ITEMS {
            return Err(ValidationError(format!(
                "order can contain at most {MAX_LINE_ITEMS} different products"
            )));
        }
        if let Some((product_id, quantity)) = self
            .items
            .iter()
            .find(|&(_, &quantity)| !(1..=MAX_QUANTITY).contains(&quantity))
        {
            return Err(ValidationError(format!(
                "quantity for product {product_id} must be between 1 and {MAX_QUANTITY} (got {quantity})"
            )));
        }

        Ok(Self {
            customer_name: optional_text("customer_name", self.customer_name.as_deref(), 100)?,
            table_number: optional_text("table_number", self.table_number.as_deref(), 20)?,
            note: optional_text("note", self.note.as_deref(), 500)?,
            items: self.items,
        })
    }
}

/// Places customer orders.
pub struct OrderService<'a> {
    shops: ShopRepository<'a>,
    products: ProductRepository<'a>,
    orders: OrderRepository<'a>,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            shops: ShopRepository::new(pool),
            products: ProductRepository::new(pool),
            orders: OrderRepository::new(pool),
        }
    }

    /// Validate and store an order for `shop_id`.
    ///
    /// # Errors
    ///
    /// - `RepositoryError::NotFound` if the shop does not exist.
    /// - `RepositoryError::Conflict` if the shop is not accepting orders.
    /// - `RepositoryError::Invalid` for bad input or products that are not
    ///   on the shop's menu or not available.
    pub async fn place(
        &self,
        shop_id: ShopId,
        input: PlaceOrderInput,
    ) -> Result<Order, RepositoryError> {
        let input = input
            .validate()
            .map_err(|e| RepositoryError::Invalid(e.to_string()))?;

        let shop = self
            .shops
            .get_by_id(shop_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        if !shop.accepting_orders {
            return Err(RepositoryError::Conflict(
                "shop is not accepting orders".to_string(),
            ));
        }

        let ids: Vec<ProductId> = input.items.keys().copied().collect();
        let prices: HashMap<ProductId, (Price, bool)> = self
            .products
            .get_many(shop.owner_id, &ids)
            .await?
            .into_iter()
            .map(|p| (p.id, (p.price, p.is_available)))
            .collect();

        let total_price = order_total(&input.items, &prices)?;

        let order = self
            .orders
            .create(&NewOrder {
                owner_id: shop.owner_id,
                shop_id: shop.id,
                customer_name: input.customer_name,
                table_number: input.table_number,
                note: input.note,
                items: input.items,
                total_price,
            })
            .await?;

        tracing::info!(
            order_id = %order.id,
            shop_id = %shop.id,
            items = order.items.len(),
            total = %order.total_price,
            "Order placed"
        );
        Ok(order)
    }
}

/// Largest total the `orders.total_price` column holds.
fn max_total() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

/// Sum price times quantity, rejecting unknown or unavailable products.
fn order_total(
    items: &OrderItems,
    prices: &HashMap<ProductId, (Price, bool)>,
) -> Result<Decimal, RepositoryError> {
    let mut total = Decimal::ZERO;
    for (product_id, &quantity) in items {
        let &(price, is_available) = prices.get(product_id).ok_or_else(|| {
            RepositoryError::Invalid(format!("product {product_id} is not on this menu"))
        })?;
        if !is_available {
            return Err(RepositoryError::Invalid(format!(
                "product {product_id} is not available"
            )));
        }
        total = total
            .checked_add(price.times(quantity))
            .filter(|total| *total <= max_total())
            .ok_or_else(|| RepositoryError::Invalid("order total is too large".to_string()))?;
    }
    Ok(total)
}
