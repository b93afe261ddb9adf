//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                                 - Liveness
//! GET    /health/ready                           - Readiness (database)
//!
//! # Public
//! POST   /api/auth/signup                        - Create owner, returns token
//! POST   /api/auth/login                         - Returns token
//! GET    /api/shops/{shop_id}/menu               - Public menu
//! POST   /api/shops/{shop_id}/orders             - Place an order
//!
//! # Owner (Authorization: Bearer <token>)
//! GET    /api/auth/me                            - Current owner
//! GET    /api/shop                               - Shop profile
//! PUT    /api/shop                               - Create or update shop profile
//! POST   /api/shop/image                         - Upload shop image (multipart "image")
//! GET    /api/categories                         - Categories in sequence order
//! POST   /api/categories                         - Create category
//! GET    /api/categories/sequence                - Category sequence
//! PUT    /api/categories/sequence                - Replace category sequence
//! GET    /api/categories/{id}                    - Category
//! PUT    /api/categories/{id}                    - Rename category
//! DELETE /api/categories/{id}                    - Delete category and its products
//! GET    /api/categories/{id}/products/sequence  - Product sequence of a category
//! PUT    /api/categories/{id}/products/sequence  - Replace product sequence
//! GET    /api/products?category_id=              - Products in display order
//! POST   /api/products                           - Create product
//! GET    /api/products/{id}                      - Product
//! PUT    /api/products/{id}                      - Update product
//! DELETE /api/products/{id}                      - Delete product
//! POST   /api/products/{id}/image                - Upload product image
//! GET    /api/orders?status=                     - Orders, oldest first
//! GET    /api/orders/{id}                        - Order
//! PATCH  /api/orders/{id}/status                 - Change order status
//! ```

pub mod auth;
pub mod categories;
pub mod extract;
pub mod health;
pub mod menu;
pub mod orders;
pub mod products;
pub mod shop;
pub mod upload;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
};

use crate::db::RepositoryError;
use crate::error::AppError;
use crate::middleware::{ClientIpKeyExtractor, auth_rate_limiter, order_rate_limiter};
use crate::state::AppState;

/// Room for multipart boundaries and part headers on top of the image itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the API router.
///
/// `max_upload_bytes` bounds image upload request bodies. `client_key` decides
/// how the rate limiters identify a client.
pub fn routes(max_upload_bytes: usize, client_key: ClientIpKeyExtractor) -> Router<AppState> {
    let auth = Router::new()
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        .layer(auth_rate_limiter(client_key));

    let ordering = Router::new()
        .route("/api/shops/{shop_id}/orders", post(orders::place))
        .layer(order_rate_limiter(client_key));

    let uploads = Router::new()
        .route("/api/shop/image", post(shop::upload_image))
        .route("/api/products/{id}/image", post(products::upload_image))
        .layer(DefaultBodyLimit::max(
            max_upload_bytes.saturating_add(MULTIPART_OVERHEAD),
        ));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::ready))
        .route("/api/auth/me", get(auth::me))
        .route("/api/shops/{shop_id}/menu", get(menu::show))
        .route("/api/shop", get(shop::show).put(shop::upsert))
        .route(
            "/api/categories",
            get(categories::index).post(categories::create),
        )
        .route(
            "/api/categories/sequence",
            get(categories::sequence).put(categories::update_sequence),
        )
        .route(
            "/api/categories/{id}",
            get(categories::show)
                .put(categories::update)
                .delete(categories::destroy),
        )
        .route(
            "/api/categories/{id}/products/sequence",
            get(categories::product_sequence).put(categories::update_product_sequence),
        )
        .route("/api/products", get(products::index).post(products::create))
        .route(
            "/api/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
        .route("/api/orders", get(orders::index))
        .route("/api/orders/{id}", get(orders::show))
        .route("/api/orders/{id}/status", patch(orders::update_status))
        .merge(auth)
        .merge(ordering)
        .merge(uploads)
}

/// Turn a repository `NotFound` into a 404 naming `what`.
pub(crate) fn not_found(what: &'static str) -> impl Fn(RepositoryError) -> AppError {
    move |err| match err {
        RepositoryError::NotFound => AppError::NotFound(what.to_string()),
        other => AppError::Database(other),
    }
}
