//! Database operations for the Mobile Order `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `owners` - Shop owner accounts (Argon2id password hashes)
//! - `shops` - One shop profile per owner
//! - `categories` / `category_sequences` - Menu categories and their display order
//! - `products` / `product_sequences` - Products and their order within a category
//! - `orders` - Customer orders (items as JSONB `product_id -> quantity`)
//!
//! Every query is scoped by owner; rows belonging to another owner behave as
//! if they did not exist.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p mobile-order-cli -- migrate
//! ```

pub mod categories;
pub mod orders;
pub mod owners;
pub mod products;
pub mod shops;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use categories::CategoryRepository;
pub use orders::OrderRepository;
pub use owners::OwnerRepository;
pub use products::ProductRepository;
pub use shops::ShopRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("{0}")]
    Conflict(String),

    /// The write references IDs outside the owner's scope or is otherwise
    /// inconsistent with stored data (e.g. a sequence that is not a permutation).
    #[error("{0}")]
    Invalid(String),
}

impl RepositoryError {
    /// Map a unique violation to `Conflict(message)`, passing other errors through.
    pub(crate) fn unique_violation(err: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_string());
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    pool_options().connect(database_url.expose_secret()).await
}

/// Create a pool that connects on first use.
///
/// Used by router tests whose requests are rejected before any query runs.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL cannot be parsed.
pub fn create_lazy_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    pool_options().connect_lazy(database_url.expose_secret())
}

fn pool_options() -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
}

/// Convert stored `INTEGER[]` values into typed IDs.
pub(crate) fn typed_ids<T: From<i32>>(ids: Vec<i32>) -> Vec<T> {
    ids.into_iter().map(T::from).collect()
}
