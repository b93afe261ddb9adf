//! Shop profile repository.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use mobile_order_core::{OwnerId, ShopId};

use super::RepositoryError;
use crate::models::{Shop, ShopInput};

const SHOP_COLUMNS: &str = "id, owner_id, name, description, phone, address, opening_hours, \
                            image_path, accepting_orders, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ShopRow {
    id: i32,
    owner_id: i32,
    name: String,
    description: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    opening_hours: Option<String>,
    image_path: Option<String>,
    accepting_orders: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ShopRow> for Shop {
    fn from(row: ShopRow) -> Self {
        Self {
            id: ShopId::new(row.id),
            owner_id: OwnerId::new(row.owner_id),
            name: row.name,
            description: row.description,
            phone: row.phone,
            address: row.address,
            opening_hours: row.opening_hours,
            image_path: row.image_path,
            accepting_orders: row.accepting_orders,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for shop profiles.
pub struct ShopRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ShopRepository<'a> {
    /// Create a new shop repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the shop belonging to `owner_id`, if one has been set up.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_owner(&self, owner_id: OwnerId) -> Result<Option<Shop>, RepositoryError> {
        let row = sqlx::query_as::<_, ShopRow>(&format!(
            "SELECT {SHOP_COLUMNS} FROM shops WHERE owner_id = $1"
        ))
        .bind(owner_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get a shop by its public ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ShopId) -> Result<Option<Shop>, RepositoryError> {
        let row = sqlx::query_as::<_, ShopRow>(&format!(
            "SELECT {SHOP_COLUMNS} FROM shops WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Create or replace the owner's shop profile. The image is left untouched.
    ///
    /// An omitted `accepting_orders` opens a new shop and leaves an existing
    /// shop's setting as it was.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, owner_id: OwnerId, input: &ShopInput) -> Result<Shop, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let shop = Self::upsert_in_tx(&mut tx, owner_id, input).await?;
        tx.commit().await?;
        Ok(shop)
    }

    /// Create or replace the owner's shop profile inside the caller's transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        owner_id: OwnerId,
        input: &ShopInput,
    ) -> Result<Shop, RepositoryError> {
        let row = sqlx::query_as::<_, ShopRow>(&format!(
            r"
            INSERT INTO shops (owner_id, name, description, phone, address, opening_hours, accepting_orders)
            VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, TRUE))
            ON CONFLICT (owner_id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                phone = EXCLUDED.phone,
                address = EXCLUDED.address,
                opening_hours = EXCLUDED.opening_hours,
                accepting_orders = COALESCE($7, shops.accepting_orders)
            RETURNING {SHOP_COLUMNS}
            "
        ))
        .bind(owner_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.opening_hours)
        .bind(input.accepting_orders)
        .fetch_one(&mut **tx)
        .await?;

        Ok(row.into())
    }

    /// Point the owner's shop at a new image.
    ///
    /// Returns the updated shop and the previous image key, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the owner has no shop yet.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_image(
        &self,
        owner_id: OwnerId,
        image_path: &str,
    ) -> Result<(Shop, Option<String>), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let previous: Option<Option<String>> = sqlx::query_scalar(
            "SELECT image_path FROM shops WHERE owner_id = $1 FOR UPDATE",
        )
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?;
        let previous = previous.ok_or(RepositoryError::NotFound)?;

        let row = sqlx::query_as::<_, ShopRow>(&format!(
            "UPDATE shops SET image_path = $2 WHERE owner_id = $1 RETURNING {SHOP_COLUMNS}"
        ))
        .bind(owner_id)
        .bind(image_path)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((row.into(), previous))
    }
}
