//! Menu assembly.
//!
//! Categories come out in the owner's category sequence and each category's
//! products in its product sequence. The public menu hides unavailable
//! products.

use std::collections::HashMap;

use serde::Serialize;
use sqlx::PgPool;

use mobile_order_core::{CategoryId, OwnerId, ProductId, ShopId, order_by_sequence};

use crate::db::{CategoryRepository, ProductRepository, RepositoryError, ShopRepository};
use crate::models::{Category, Product, Shop};

/// A shop's public menu.
#[derive(Debug, Clone, Serialize)]
pub struct Menu {
    pub shop: Shop,
    pub categories: Vec<MenuCategory>,
}

/// One category with its products, both in display order.
#[derive(Debug, Clone, Serialize)]
pub struct MenuCategory {
    #[serde(flatten)]
    pub category: Category,
    pub products: Vec<Product>,
}

/// Builds ordered menus from categories, products and their sequences.
pub struct MenuService<'a> {
    shops: ShopRepository<'a>,
    categories: CategoryRepository<'a>,
    products: ProductRepository<'a>,
}

impl<'a> MenuService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            shops: ShopRepository::new(pool),
            categories: CategoryRepository::new(pool),
            products: ProductRepository::new(pool),
        }
    }

    /// The menu customers see for `shop_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the shop does not exist.
    pub async fn public_menu(&self, shop_id: ShopId) -> Result<Menu, RepositoryError> {
        let shop = self
            .shops
            .get_by_id(shop_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let categories = self.categories_with_products(shop.owner_id, true).await?;
        Ok(Menu { shop, categories })
    }

    /// Every category of the owner with its products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn categories_with_products(
        &self,
        owner_id: OwnerId,
        available_only: bool,
    ) -> Result<Vec<MenuCategory>, RepositoryError> {
        let categories = self.categories.list(owner_id).await?;
        let products = self.products.list_all(owner_id).await?;
        let sequences = self.products.all_sequences(owner_id).await?;

        Ok(assemble(categories, products, sequences, available_only))
    }

    /// The owner's products, either of one category or of the whole menu,
    /// in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if `category_id` is not the owner's.
    pub async fn products(
        &self,
        owner_id: OwnerId,
        category_id: Option<CategoryId>,
    ) -> Result<Vec<Product>, RepositoryError> {
        match category_id {
            Some(category_id) => {
                if self.categories.get(owner_id, category_id).await?.is_none() {
                    return Err(RepositoryError::NotFound);
                }
                self.products.list_in_category(owner_id, category_id).await
            }
            None => Ok(self
                .categories_with_products(owner_id, false)
                .await?
                .into_iter()
                .flat_map(|entry| entry.products)
                .collect()),
        }
    }
}

/// Group products under their (already ordered) categories.
fn assemble(
    categories: Vec<Category>,
    products: Vec<Product>,
    sequences: Vec<(CategoryId, Vec<ProductId>)>,
    available_only: bool,
) -> Vec<MenuCategory> {
    let mut by_category: HashMap<CategoryId, Vec<Product>> = HashMap::new();
    for product in products {
        if available_only && !product.is_available {
            continue;
        }
        by_category.entry(product.category_id).or_default().push(product);
    }
    let mut sequences: HashMap<CategoryId, Vec<ProductId>> = sequences.into_iter().collect();

    categories
        .into_iter()
        .map(|category| {
            let products = by_category.remove(&category.id).unwrap_or_default();
            let sequence = sequences.remove(&category.id).unwrap_or_default();
            MenuCategory {
                products: order_by_sequence(products, &sequence, |p: &Product| p.id),
                category,
            }
        })
        .collect()
}
