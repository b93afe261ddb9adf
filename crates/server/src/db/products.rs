//! Product repository and the per-category product sequences.
//!
//! Creating a product appends it to its category's sequence, deleting removes
//! it, and moving it to another category moves its ID between sequences, all
//! within one transaction.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use mobile_order_core::{
    CategoryId, OwnerId, Price, ProductId, order_by_sequence, validate_permutation,
};

use super::{RepositoryError, typed_ids};
use crate::models::{Product, ProductInput};

const PRODUCT_COLUMNS: &str = "id, owner_id, category_id, name, description, price, image_path, \
                               is_available, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    owner_id: i32,
    category_id: i32,
    name: String,
    description: Option<String>,
    price: Price,
    image_path: Option<String>,
    is_available: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            owner_id: OwnerId::new(row.owner_id),
            category_id: CategoryId::new(row.category_id),
            name: row.name,
            description: row.description,
            price: row.price,
            image_path: row.image_path,
            is_available: row.is_available,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for menu products.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List every product the owner has, in ID order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self, owner_id: OwnerId) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE owner_id = $1 ORDER BY id"
        ))
        .bind(owner_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// List the products of one category in sequence order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_in_category(
        &self,
        owner_id: OwnerId,
        category_id: CategoryId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE owner_id = $1 AND category_id = $2
            ORDER BY id
            "
        ))
        .bind(owner_id)
        .bind(category_id)
        .fetch_all(self.pool)
        .await?;

        let sequence = self.stored_sequence(owner_id, category_id).await?;
        let products = rows.into_iter().map(Product::from).collect();
        Ok(order_by_sequence(products, &sequence, |p: &Product| p.id))
    }

    /// Get one of the owner's products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        owner_id: OwnerId,
        id: ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get the owner's products among `ids`. Unknown IDs are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(
        &self,
        owner_id: OwnerId,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, RepositoryError> {
        let ids: Vec<i32> = ids.iter().map(|id| id.as_i32()).collect();
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE owner_id = $1 AND id = ANY($2)"
        ))
        .bind(owner_id)
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Create a product at the end of its category's sequence.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` if the category is not the owner's.
    pub async fn create(
        &self,
        owner_id: OwnerId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let product = Self::create_in_tx(&mut tx, owner_id, input).await?;
        tx.commit().await?;
        Ok(product)
    }

    /// Create a product inside the caller's transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` if the category is not the owner's.
    pub async fn create_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        owner_id: OwnerId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        ensure_category(tx, owner_id, input.category_id).await?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO products (owner_id, category_id, name, description, price, is_available)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(owner_id)
        .bind(input.category_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.is_available)
        .fetch_one(&mut **tx)
        .await?;

        append_to_sequence(tx, owner_id, input.category_id, row.id).await?;

        Ok(row.into())
    }

    /// Replace a product's fields, keeping its image.
    ///
    /// A change of category moves the product to the end of the new
    /// category's sequence.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Invalid` if the new category is not the owner's.
    pub async fn update(
        &self,
        owner_id: OwnerId,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: i32 = sqlx::query_scalar(
            "SELECT category_id FROM products WHERE id = $1 AND owner_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;
        let moved = CategoryId::new(current) != input.category_id;

        if moved {
            ensure_category(&mut tx, owner_id, input.category_id).await?;
        }

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE products SET
                category_id = $3,
                name = $4,
                description = $5,
                price = $6,
                is_available = $7
            WHERE id = $1 AND owner_id = $2
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(owner_id)
        .bind(input.category_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.is_available)
        .fetch_one(&mut *tx)
        .await?;

        if moved {
            remove_from_sequence(&mut tx, owner_id, CategoryId::new(current), row.id).await?;
            append_to_sequence(&mut tx, owner_id, input.category_id, row.id).await?;
            tracing::debug!(
                product_id = row.id,
                from = current,
                to = %input.category_id,
                "Product moved between categories"
            );
        }

        tx.commit().await?;
        Ok(row.into())
    }

    /// Delete a product and drop it from its category's sequence.
    ///
    /// Returns the product's image key, if it had one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn delete(
        &self,
        owner_id: OwnerId,
        id: ProductId,
    ) -> Result<Option<String>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (category_id, image_path): (i32, Option<String>) = sqlx::query_as(
            r"
            DELETE FROM products WHERE id = $1 AND owner_id = $2
            RETURNING category_id, image_path
            ",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        remove_from_sequence(&mut tx, owner_id, CategoryId::new(category_id), id.as_i32()).await?;

        tx.commit().await?;
        Ok(image_path)
    }

    /// Point a product at a new image.
    ///
    /// Returns the updated product and the previous image key, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn set_image(
        &self,
        owner_id: OwnerId,
        id: ProductId,
        image_path: &str,
    ) -> Result<(Product, Option<String>), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let previous: Option<String> = sqlx::query_scalar::<_, Option<String>>(
            "SELECT image_path FROM products WHERE id = $1 AND owner_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE products SET image_path = $3
            WHERE id = $1 AND owner_id = $2
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(owner_id)
        .bind(image_path)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((row.into(), previous))
    }

    /// A category's product IDs in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn sequence(
        &self,
        owner_id: OwnerId,
        category_id: CategoryId,
    ) -> Result<Vec<ProductId>, RepositoryError> {
        let ids: Vec<i32> = sqlx::query_scalar(
            "SELECT id FROM products WHERE owner_id = $1 AND category_id = $2 ORDER BY id",
        )
        .bind(owner_id)
        .bind(category_id)
        .fetch_all(self.pool)
        .await?;

        let sequence = self.stored_sequence(owner_id, category_id).await?;
        Ok(order_by_sequence(typed_ids(ids), &sequence, |&id: &ProductId| id))
    }

    /// Every stored product sequence of the owner, keyed by category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn all_sequences(
        &self,
        owner_id: OwnerId,
    ) -> Result<Vec<(CategoryId, Vec<ProductId>)>, RepositoryError> {
        let rows: Vec<(i32, Vec<i32>)> = sqlx::query_as(
            "SELECT category_id, product_ids FROM product_sequences WHERE owner_id = $1",
        )
        .bind(owner_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(category_id, ids)| (CategoryId::new(category_id), typed_ids(ids)))
            .collect())
    }

    /// Replace a category's product sequence.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category is not the owner's.
    /// Returns `RepositoryError::Invalid` unless `sequence` lists each product
    /// of the category exactly once.
    pub async fn set_sequence(
        &self,
        owner_id: OwnerId,
        category_id: CategoryId,
        sequence: &[ProductId],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let owned: Option<i32> = sqlx::query_scalar(
            "SELECT id FROM categories WHERE id = $1 AND owner_id = $2 FOR UPDATE",
        )
        .bind(category_id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?;
        if owned.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let existing: Vec<i32> = sqlx::query_scalar(
            "SELECT id FROM products WHERE owner_id = $1 AND category_id = $2 FOR UPDATE",
        )
        .bind(owner_id)
        .bind(category_id)
        .fetch_all(&mut *tx)
        .await?;
        validate_permutation(sequence, &typed_ids::<ProductId>(existing))
            .map_err(|e| RepositoryError::Invalid(e.to_string()))?;

        let ids: Vec<i32> = sequence.iter().map(|id| id.as_i32()).collect();
        sqlx::query(
            r"
            INSERT INTO product_sequences (owner_id, category_id, product_ids)
            VALUES ($1, $2, $3)
            ON CONFLICT (owner_id, category_id) DO UPDATE SET
                product_ids = EXCLUDED.product_ids,
                updated_at = NOW()
            ",
        )
        .bind(owner_id)
        .bind(category_id)
        .bind(&ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(
            owner_id = %owner_id,
            category_id = %category_id,
            count = ids.len(),
            "Product sequence replaced"
        );
        Ok(())
    }

    async fn stored_sequence(
        &self,
        owner_id: OwnerId,
        category_id: CategoryId,
    ) -> Result<Vec<ProductId>, RepositoryError> {
        let ids: Option<Vec<i32>> = sqlx::query_scalar(
            "SELECT product_ids FROM product_sequences WHERE owner_id = $1 AND category_id = $2",
        )
        .bind(owner_id)
        .bind(category_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(typed_ids(ids.unwrap_or_default()))
    }
}

/// Lock the category row, failing if it is not the owner's.
async fn ensure_category(
    tx: &mut Transaction<'_, Postgres>,
    owner_id: OwnerId,
    category_id: CategoryId,
) -> Result<(), RepositoryError> {
    let found: Option<i32> = sqlx::query_scalar(
        "SELECT id FROM categories WHERE id = $1 AND owner_id = $2 FOR SHARE",
    )
    .bind(category_id)
    .bind(owner_id)
    .fetch_optional(&mut **tx)
    .await?;

    found
        .map(|_| ())
        .ok_or_else(|| RepositoryError::Invalid(format!("category {category_id} does not exist")))
}

async fn append_to_sequence(
    tx: &mut Transaction<'_, Postgres>,
    owner_id: OwnerId,
    category_id: CategoryId,
    product_id: i32,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO product_sequences (owner_id, category_id, product_ids)
        VALUES ($1, $2, ARRAY[$3]::INTEGER[])
        ON CONFLICT (owner_id, category_id) DO UPDATE SET
            product_ids = array_append(product_sequences.product_ids, $3),
            updated_at = NOW()
        ",
    )
    .bind(owner_id)
    .bind(category_id)
    .bind(product_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn remove_from_sequence(
    tx: &mut Transaction<'_, Postgres>,
    owner_id: OwnerId,
    category_id: CategoryId,
    product_id: i32,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        UPDATE product_sequences
        SET product_ids = array_remove(product_ids, $3), updated_at = NOW()
        WHERE owner_id = $1 AND category_id = $2
        ",
    )
    .bind(owner_id)
    .bind(category_id)
    .bind(product_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
