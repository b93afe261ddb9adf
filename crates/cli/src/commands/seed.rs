//! Seed a shop profile and menu from a YAML file.
//!
//! The whole file is parsed and validated before connecting to the database.
//! Categories and products are created in file order, which becomes their
//! display sequence. Seeding refuses to touch an owner whose menu already has
//! categories, and every write runs in one transaction.
//!
//! ```yaml
//! shop:
//!   name: Harbor Street Coffee
//!   accepting_orders: true
//! categories:
//!   - name: Coffee
//!     products:
//!       - name: Espresso
//!         price: "2.80"
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use mobile_order_core::{CategoryId, Email, OwnerId, Price};
use mobile_order_server::db::{
    CategoryRepository, OwnerRepository, ProductRepository, RepositoryError, ShopRepository,
};
use mobile_order_server::models::{CategoryInput, ProductInput, ShopInput, ValidationError};

use super::{CommandError, connect};

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid menu file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid menu: {0}")]
    Invalid(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("No owner with email {0}")]
    OwnerNotFound(String),

    #[error("Owner {0} already has a menu")]
    MenuNotEmpty(String),

    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<ValidationError> for SeedError {
    fn from(err: ValidationError) -> Self {
        Self::Invalid(err.0)
    }
}

/// Top-level layout of a menu file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MenuFile {
    pub shop: ShopInput,
    #[serde(default)]
    pub categories: Vec<SeedCategory>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedCategory {
    pub name: String,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

const fn default_available() -> bool {
    true
}

impl SeedProduct {
    fn input(&self, category_id: CategoryId) -> ProductInput {
        ProductInput {
            category_id,
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            is_available: self.is_available,
        }
    }
}

/// Parse a menu file and validate every entry.
///
/// Returned inputs are trimmed. Category names must be unique.
///
/// # Errors
///
/// Returns `Parse` for malformed YAML and `Invalid` for the first entry that
/// fails validation.
pub fn parse_menu(content: &str) -> Result<MenuFile, SeedError> {
    let file: MenuFile = serde_yaml::from_str(content)?;
    let shop = file.shop.validate()?;

    let mut seen = HashSet::new();
    let mut categories = Vec::with_capacity(file.categories.len());
    for category in file.categories {
        let name = CategoryInput {
            name: category.name,
        }
        .validate()?
        .name;
        if !seen.insert(name.clone()) {
            return Err(SeedError::Invalid(format!("duplicate category \"{name}\"")));
        }

        let products = category
            .products
            .into_iter()
            .map(|product| -> Result<SeedProduct, SeedError> {
                let input = product.input(CategoryId::new(0)).validate()?;
                Ok(SeedProduct {
                    name: input.name,
                    description: input.description,
                    ..product
                })
            })
            .collect::<Result<Vec<_>, SeedError>>()?;

        categories.push(SeedCategory { name, products });
    }

    Ok(MenuFile { shop, categories })
}

/// Seed the shop and menu in `path` for the owner with `email`.
///
/// # Errors
///
/// Returns an error if the file is unreadable or invalid, the owner does not
/// exist or already has categories, or a database operation fails.
pub async fn menu(email: &str, path: &Path) -> Result<(), SeedError> {
    info!(path = %path.display(), "Loading menu from file");
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Read {
            path: path.display().to_string(),
            source,
        })?;
    let menu = parse_menu(&content)?;
    info!(categories = menu.categories.len(), "Menu file validated");

    let email = Email::parse(email).map_err(|e| SeedError::InvalidEmail(e.to_string()))?;
    let pool = connect().await?;

    let owner = OwnerRepository::new(&pool)
        .get_by_email(&email)
        .await?
        .ok_or_else(|| SeedError::OwnerNotFound(email.to_string()))?;

    let product_count = seed_owner(&pool, owner.id, &email, &menu).await?;

    info!("Seeding complete!");
    info!("  Categories: {}", menu.categories.len());
    info!("  Products: {product_count}");
    Ok(())
}

/// Write `menu` for `owner_id` in a single transaction.
///
/// Nothing is committed unless every write succeeds. Returns the number of
/// products created.
async fn seed_owner(
    pool: &PgPool,
    owner_id: OwnerId,
    email: &Email,
    menu: &MenuFile,
) -> Result<usize, SeedError> {
    if !CategoryRepository::new(pool).list(owner_id).await?.is_empty() {
        return Err(SeedError::MenuNotEmpty(email.to_string()));
    }

    let mut tx = pool.begin().await.map_err(RepositoryError::from)?;

    let shop = ShopRepository::upsert_in_tx(&mut tx, owner_id, &menu.shop).await?;
    info!(shop_id = %shop.id, name = %shop.name, "Shop profile staged");

    let mut product_count = 0usize;
    for seed in &menu.categories {
        let category = CategoryRepository::create_in_tx(&mut tx, owner_id, &seed.name).await?;
        for product in &seed.products {
            ProductRepository::create_in_tx(&mut tx, owner_id, &product.input(category.id))
                .await?;
            product_count += 1;
        }
        info!(category = %category.name, products = seed.products.len(), "Category staged");
    }

    tx.commit().await.map_err(RepositoryError::from)?;
    Ok(product_count)
}
