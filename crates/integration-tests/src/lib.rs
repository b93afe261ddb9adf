//! Integration tests for Mobile Order.
//!
//! The tests drive a running server over HTTP and are `#[ignore]`d by default.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and apply migrations
//! mo-cli migrate
//!
//! # Start the server (each test context poses as its own client IP)
//! MOBILE_ORDER_TRUST_PROXY_HEADERS=1 cargo run -p mobile-order-server
//!
//! # Run integration tests
//! cargo test -p mobile-order-integration-tests -- --ignored
//! ```
//!
//! `MOBILE_ORDER_BASE_URL` points the tests at a different server
//! (default `http://localhost:3000`). Every test signs up fresh owners with
//! random emails, so runs do not interfere with each other.

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Password used for every test owner.
pub const PASSWORD: &str = "integration-test-password";

/// Base URL of the server under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("MOBILE_ORDER_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A random address that has never been registered.
#[must_use]
pub fn unique_email() -> String {
    format!("owner-{}@example.com", Uuid::new_v4().simple())
}

/// Distinct client address so each test gets its own rate-limit bucket.
fn client_ip() -> String {
    let [a, b, c, ..] = Uuid::new_v4().into_bytes();
    format!("10.{a}.{b}.{c}")
}

/// HTTP client bound to the server under test.
#[derive(Debug, Clone)]
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    forwarded_for: String,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url(),
            forwarded_for: client_ip(),
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Unauthenticated request.
    #[must_use]
    pub fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .header("x-forwarded-for", &self.forwarded_for)
    }

    /// Register a new owner and return their session.
    pub async fn signup(&self) -> OwnerSession {
        let email = unique_email();
        let resp = self
            .request(reqwest::Method::POST, "/api/auth/signup")
            .json(&json!({ "email": email, "password": PASSWORD }))
            .send()
            .await
            .expect("Failed to sign up");
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body: Value = resp.json().await.expect("Invalid signup response");
        OwnerSession {
            ctx: self.clone(),
            email,
            owner_id: body["owner"]["id"].as_i64().expect("owner id"),
            token: body["token"].as_str().expect("token").to_string(),
        }
    }

    /// Register an owner with an open shop.
    pub async fn owner_with_shop(&self, name: &str) -> (OwnerSession, i64) {
        let owner = self.signup().await;
        let shop = owner
            .put_json("/api/shop", &json!({ "name": name }))
            .await;
        let shop_id = shop["id"].as_i64().expect("shop id");
        (owner, shop_id)
    }
}

/// An authenticated owner.
#[derive(Debug, Clone)]
pub struct OwnerSession {
    pub ctx: TestContext,
    pub email: String,
    pub owner_id: i64,
    pub token: String,
}

impl OwnerSession {
    /// Request carrying this owner's bearer token.
    #[must_use]
    pub fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.ctx.request(method, path).bearer_auth(&self.token)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.request(reqwest::Method::GET, path)
            .send()
            .await
            .expect("GET failed")
    }

    pub async fn delete(&self, path: &str) -> Response {
        self.request(reqwest::Method::DELETE, path)
            .send()
            .await
            .expect("DELETE failed")
    }

    pub async fn send_json(&self, method: reqwest::Method, path: &str, body: &Value) -> Response {
        self.request(method, path)
            .json(body)
            .send()
            .await
            .expect("request failed")
    }

    /// `GET` expecting 200 with a JSON body.
    pub async fn get_json(&self, path: &str) -> Value {
        expect_json(self.get(path).await, StatusCode::OK).await
    }

    /// `POST` expecting 201 with a JSON body.
    pub async fn post_json(&self, path: &str, body: &Value) -> Value {
        let resp = self.send_json(reqwest::Method::POST, path, body).await;
        expect_json(resp, StatusCode::CREATED).await
    }

    /// `PUT` expecting 200 with a JSON body.
    pub async fn put_json(&self, path: &str, body: &Value) -> Value {
        let resp = self.send_json(reqwest::Method::PUT, path, body).await;
        expect_json(resp, StatusCode::OK).await
    }

    /// Create a category and return its ID.
    pub async fn create_category(&self, name: &str) -> i64 {
        self.post_json("/api/categories", &json!({ "name": name }))
            .await["id"]
            .as_i64()
            .expect("category id")
    }

    /// Create an available product and return its ID.
    pub async fn create_product(&self, category_id: i64, name: &str, price: &str) -> i64 {
        self.post_json(
            "/api/products",
            &json!({ "category_id": category_id, "name": name, "price": price }),
        )
        .await["id"]
            .as_i64()
            .expect("product id")
    }
}

/// Assert the status and decode the JSON body.
pub async fn expect_json(resp: Response, status: StatusCode) -> Value {
    let actual = resp.status();
    let body = resp.text().await.expect("Failed to read response");
    assert_eq!(actual, status, "unexpected status, body: {body}");
    serde_json::from_str(&body).expect("Response is not JSON")
}

/// IDs from a JSON array of objects, in order.
#[must_use]
pub fn ids(items: &Value) -> Vec<i64> {
    items
        .as_array()
        .expect("expected an array")
        .iter()
        .map(|item| item["id"].as_i64().expect("id"))
        .collect()
}

/// IDs from a `{"sequence": [...]}` body.
#[must_use]
pub fn sequence(body: &Value) -> Vec<i64> {
    body["sequence"]
        .as_array()
        .expect("expected a sequence")
        .iter()
        .map(|id| id.as_i64().expect("id"))
        .collect()
}
