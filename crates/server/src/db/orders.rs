//! Order repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use mobile_order_core::{OrderId, OrderStatus, OwnerId, ShopId};

use super::RepositoryError;
use crate::models::{Order, OrderItems};

const ORDER_COLUMNS: &str = "id, owner_id, shop_id, customer_name, table_number, note, items, \
                             total_price, status, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    owner_id: i32,
    shop_id: i32,
    customer_name: Option<String>,
    table_number: Option<String>,
    note: Option<String>,
    items: Json<OrderItems>,
    total_price: Decimal,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            owner_id: OwnerId::new(row.owner_id),
            shop_id: ShopId::new(row.shop_id),
            customer_name: row.customer_name,
            table_number: row.table_number,
            note: row.note,
            items: row.items.0,
            total_price: row.total_price,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A validated order ready to be stored.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub owner_id: OwnerId,
    pub shop_id: ShopId,
    pub customer_name: Option<String>,
    pub table_number: Option<String>,
    pub note: Option<String>,
    pub items: OrderItems,
    pub total_price: Decimal,
}

/// Repository for customer orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a new order with status `new`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO orders (owner_id, shop_id, customer_name, table_number, note, items, total_price)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(order.owner_id)
        .bind(order.shop_id)
        .bind(&order.customer_name)
        .bind(&order.table_number)
        .bind(&order.note)
        .bind(Json(&order.items))
        .bind(order.total_price)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// List the owner's orders, oldest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        owner_id: OwnerId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE owner_id = $1 AND ($2::order_status IS NULL OR status = $2)
            ORDER BY created_at, id
            "
        ))
        .bind(owner_id)
        .bind(status)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get one of the owner's orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, owner_id: OwnerId, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Move an order to `next` if its current status allows it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Conflict` if the transition is not allowed.
    pub async fn update_status(
        &self,
        owner_id: OwnerId,
        id: OrderId,
        next: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: OrderStatus = sqlx::query_scalar(
            "SELECT status FROM orders WHERE id = $1 AND owner_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if !current.can_transition_to(next) {
            return Err(RepositoryError::Conflict(format!(
                "cannot change order status from {current} to {next}"
            )));
        }

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders SET status = $3 WHERE id = $1 AND owner_id = $2 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(owner_id)
        .bind(next)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(order_id = %id, from = %current, to = %next, "Order status changed");
        Ok(row.into())
    }
}
