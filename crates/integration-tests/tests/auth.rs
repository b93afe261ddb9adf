//! Owner signup, login and token handling.
//!
//! Requires a running server with migrated database. Run with:
//! `cargo test -p mobile-order-integration-tests -- --ignored`

use mobile_order_integration_tests::{PASSWORD, TestContext, expect_json, unique_email};
use reqwest::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_signup_then_login() {
    let ctx = TestContext::new();
    let owner = ctx.signup().await;

    let resp = ctx
        .request(Method::POST, "/api/auth/login")
        .json(&json!({ "email": owner.email, "password": PASSWORD }))
        .send()
        .await
        .expect("login failed");
    let body = expect_json(resp, StatusCode::OK).await;
    assert_eq!(body["owner"]["id"].as_i64(), Some(owner.owner_id));
    assert!(body["token"].as_str().is_some_and(|t| t.starts_with("v1.")));
    assert!(body["expires_at"].is_string());

    let me = owner.get_json("/api/auth/me").await;
    assert_eq!(me["email"], owner.email.as_str());
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_email_is_case_insensitive() {
    let ctx = TestContext::new();
    let owner = ctx.signup().await;

    let resp = ctx
        .request(Method::POST, "/api/auth/login")
        .json(&json!({ "email": owner.email.to_uppercase(), "password": PASSWORD }))
        .send()
        .await
        .expect("login failed");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_duplicate_signup_conflicts() {
    let ctx = TestContext::new();
    let owner = ctx.signup().await;

    let resp = ctx
        .request(Method::POST, "/api/auth/signup")
        .json(&json!({ "email": owner.email, "password": PASSWORD }))
        .send()
        .await
        .expect("signup failed");
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_bad_credentials_are_rejected() {
    let ctx = TestContext::new();
    let owner = ctx.signup().await;

    for (email, password) in [
        (owner.email.as_str(), "wrong-password"),
        ("nobody@example.com", PASSWORD),
    ] {
        let resp = ctx
            .request(Method::POST, "/api/auth/login")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("login failed");
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{email}");
    }
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_signup_validation() {
    let ctx = TestContext::new();

    for body in [
        json!({ "email": "not-an-email", "password": PASSWORD }),
        json!({ "email": unique_email(), "password": "short" }),
    ] {
        let resp = ctx
            .request(Method::POST, "/api/auth/signup")
            .json(&body)
            .send()
            .await
            .expect("signup failed");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{body}");
    }
}
