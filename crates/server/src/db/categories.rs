//! Category repository and the per-owner category sequence.
//!
//! Writes that add or remove a category update `category_sequences` in the
//! same transaction, so the stored sequence always names every category
//! created through the API.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use mobile_order_core::{CategoryId, OwnerId, order_by_sequence, validate_permutation};

use super::{RepositoryError, typed_ids};
use crate::models::Category;

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    owner_id: i32,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            owner_id: OwnerId::new(row.owner_id),
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const DUPLICATE_NAME: &str = "a category with this name already exists";

/// Repository for menu categories.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List the owner's categories in sequence order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self, owner_id: OwnerId) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, owner_id, name, created_at, updated_at
            FROM categories
            WHERE owner_id = $1
            ORDER BY id
            ",
        )
        .bind(owner_id)
        .fetch_all(self.pool)
        .await?;

        let sequence = self.stored_sequence(owner_id).await?;
        let categories = rows.into_iter().map(Category::from).collect();
        Ok(order_by_sequence(categories, &sequence, |c: &Category| c.id))
    }

    /// Get one of the owner's categories.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        owner_id: OwnerId,
        id: CategoryId,
    ) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, owner_id, name, created_at, updated_at
            FROM categories
            WHERE id = $1 AND owner_id = $2
            ",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Create a category and append it to the owner's sequence.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the owner already has a category
    /// with this name.
    pub async fn create(&self, owner_id: OwnerId, name: &str) -> Result<Category, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let category = Self::create_in_tx(&mut tx, owner_id, name).await?;
        tx.commit().await?;
        Ok(category)
    }

    /// Create a category inside the caller's transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the owner already has a category
    /// with this name.
    pub async fn create_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        owner_id: OwnerId,
        name: &str,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO categories (owner_id, name)
            VALUES ($1, $2)
            RETURNING id, owner_id, name, created_at, updated_at
            ",
        )
        .bind(owner_id)
        .bind(name)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| RepositoryError::unique_violation(e, DUPLICATE_NAME))?;

        sqlx::query(
            r"
            INSERT INTO category_sequences (owner_id, category_ids)
            VALUES ($1, ARRAY[$2]::INTEGER[])
            ON CONFLICT (owner_id) DO UPDATE SET
                category_ids = array_append(category_sequences.category_ids, $2),
                updated_at = NOW()
            ",
        )
        .bind(owner_id)
        .bind(row.id)
        .execute(&mut **tx)
        .await?;

        Ok(row.into())
    }

    /// Rename one of the owner's categories.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    /// Returns `RepositoryError::Conflict` if the new name is taken.
    pub async fn rename(
        &self,
        owner_id: OwnerId,
        id: CategoryId,
        name: &str,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            UPDATE categories SET name = $3
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, name, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(owner_id)
        .bind(name)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_violation(e, DUPLICATE_NAME))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a category together with its products and product sequence.
    ///
    /// Returns the image keys of the deleted products so their files can be
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    pub async fn delete(
        &self,
        owner_id: OwnerId,
        id: CategoryId,
    ) -> Result<Vec<String>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let images: Vec<String> = sqlx::query_scalar(
            r"
            SELECT image_path FROM products
            WHERE category_id = $1 AND owner_id = $2 AND image_path IS NOT NULL
            ",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_all(&mut *tx)
        .await?;

        // products and product_sequences cascade
        let deleted = sqlx::query("DELETE FROM categories WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query(
            r"
            UPDATE category_sequences
            SET category_ids = array_remove(category_ids, $2), updated_at = NOW()
            WHERE owner_id = $1
            ",
        )
        .bind(owner_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(images)
    }

    /// The owner's category IDs in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn sequence(&self, owner_id: OwnerId) -> Result<Vec<CategoryId>, RepositoryError> {
        let ids: Vec<i32> =
            sqlx::query_scalar("SELECT id FROM categories WHERE owner_id = $1 ORDER BY id")
                .bind(owner_id)
                .fetch_all(self.pool)
                .await?;

        let sequence = self.stored_sequence(owner_id).await?;
        Ok(order_by_sequence(typed_ids(ids), &sequence, |&id: &CategoryId| id))
    }

    /// Replace the owner's category sequence.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` unless `sequence` lists each of the
    /// owner's categories exactly once.
    pub async fn set_sequence(
        &self,
        owner_id: OwnerId,
        sequence: &[CategoryId],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let existing = lock_category_ids(&mut tx, owner_id).await?;
        validate_permutation(sequence, &existing)
            .map_err(|e| RepositoryError::Invalid(e.to_string()))?;

        let ids: Vec<i32> = sequence.iter().map(|id| id.as_i32()).collect();
        sqlx::query(
            r"
            INSERT INTO category_sequences (owner_id, category_ids)
            VALUES ($1, $2)
            ON CONFLICT (owner_id) DO UPDATE SET
                category_ids = EXCLUDED.category_ids,
                updated_at = NOW()
            ",
        )
        .bind(owner_id)
        .bind(&ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(owner_id = %owner_id, count = ids.len(), "Category sequence replaced");
        Ok(())
    }

    async fn stored_sequence(&self, owner_id: OwnerId) -> Result<Vec<CategoryId>, RepositoryError> {
        let ids: Option<Vec<i32>> = sqlx::query_scalar(
            "SELECT category_ids FROM category_sequences WHERE owner_id = $1",
        )
        .bind(owner_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(typed_ids(ids.unwrap_or_default()))
    }
}

async fn lock_category_ids(
    tx: &mut Transaction<'_, Postgres>,
    owner_id: OwnerId,
) -> Result<Vec<CategoryId>, RepositoryError> {
    let ids: Vec<i32> =
        sqlx::query_scalar("SELECT id FROM categories WHERE owner_id = $1 FOR UPDATE")
            .bind(owner_id)
            .fetch_all(&mut **tx)
            .await?;
    Ok(typed_ids(ids))
}
