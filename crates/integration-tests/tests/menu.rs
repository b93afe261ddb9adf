//! Shop profile, categories, products and their display sequences.
//!
//! Requires a running server with migrated database. Run with:
//! `cargo test -p mobile-order-integration-tests -- --ignored`

use mobile_order_integration_tests::{TestContext, expect_json, ids, sequence};
use reqwest::{Method, StatusCode, multipart};
use serde_json::json;

/// Smallest valid PNG header; the server only checks magic bytes.
const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_shop_profile_upsert() {
    let ctx = TestContext::new();
    let owner = ctx.signup().await;

    let resp = owner.get("/api/shop").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let created = owner
        .put_json(
            "/api/shop",
            &json!({ "name": "Harbor Coffee", "phone": "555-0142" }),
        )
        .await;
    assert_eq!(created["accepting_orders"], true);

    let updated = owner
        .put_json(
            "/api/shop",
            &json!({ "name": "Harbor Coffee Bar", "accepting_orders": false }),
        )
        .await;
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["name"], "Harbor Coffee Bar");
    assert_eq!(updated["phone"], serde_json::Value::Null);
    assert_eq!(updated["accepting_orders"], false);

    let edited = owner
        .put_json(
            "/api/shop",
            &json!({ "name": "Harbor Coffee Bar", "address": "12 Harbor St" }),
        )
        .await;
    assert_eq!(edited["address"], "12 Harbor St");
    assert_eq!(edited["accepting_orders"], false);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_category_crud_and_sequence() {
    let ctx = TestContext::new();
    let owner = ctx.signup().await;

    let coffee = owner.create_category("Coffee").await;
    let tea = owner.create_category("Tea").await;
    let cakes = owner.create_category("Cakes").await;

    let listed = owner.get_json("/api/categories").await;
    assert_eq!(ids(&listed), [coffee, tea, cakes]);

    let resp = owner
        .send_json(Method::POST, "/api/categories", &json!({ "name": "Tea" }))
        .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let renamed = owner
        .put_json(&format!("/api/categories/{tea}"), &json!({ "name": "Loose Tea" }))
        .await;
    assert_eq!(renamed["name"], "Loose Tea");

    owner
        .put_json(
            "/api/categories/sequence",
            &json!({ "sequence": [cakes, coffee, tea] }),
        )
        .await;
    let seq = owner.get_json("/api/categories/sequence").await;
    assert_eq!(sequence(&seq), [cakes, coffee, tea]);
    assert_eq!(ids(&owner.get_json("/api/categories").await), [cakes, coffee, tea]);

    // Not a permutation of the owner's categories
    for bad in [json!([cakes, coffee]), json!([cakes, coffee, tea, tea])] {
        let resp = owner
            .send_json(Method::PUT, "/api/categories/sequence", &json!({ "sequence": bad }))
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{bad}");
    }

    let resp = owner.delete(&format!("/api/categories/{coffee}")).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let seq = owner.get_json("/api/categories/sequence").await;
    assert_eq!(sequence(&seq), [cakes, tea]);

    let resp = owner.get(&format!("/api/categories/{coffee}")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_product_sequence_follows_category_moves() {
    let ctx = TestContext::new();
    let owner = ctx.signup().await;

    let drinks = owner.create_category("Drinks").await;
    let food = owner.create_category("Food").await;
    let cola = owner.create_product(drinks, "Cola", "2.50").await;
    let juice = owner.create_product(drinks, "Juice", "3.00").await;
    let toast = owner.create_product(food, "Toast", "4.00").await;

    let path = format!("/api/categories/{drinks}/products/sequence");
    assert_eq!(sequence(&owner.get_json(&path).await), [cola, juice]);

    owner
        .put_json(&path, &json!({ "sequence": [juice, cola] }))
        .await;
    let listed = owner
        .get_json(&format!("/api/products?category_id={drinks}"))
        .await;
    assert_eq!(ids(&listed), [juice, cola]);

    // A product from another category is not part of this sequence
    let resp = owner
        .send_json(Method::PUT, &path, &json!({ "sequence": [juice, cola, toast] }))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let moved = owner
        .put_json(
            &format!("/api/products/{juice}"),
            &json!({ "category_id": food, "name": "Juice", "price": "3.20" }),
        )
        .await;
    assert_eq!(moved["category_id"].as_i64(), Some(food));
    assert_eq!(moved["price"], "3.20");

    assert_eq!(sequence(&owner.get_json(&path).await), [cola]);
    let food_path = format!("/api/categories/{food}/products/sequence");
    assert_eq!(sequence(&owner.get_json(&food_path).await), [toast, juice]);

    let resp = owner.delete(&format!("/api/products/{cola}")).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(sequence(&owner.get_json(&path).await).is_empty());
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_product_in_unknown_category_is_rejected() {
    let ctx = TestContext::new();
    let owner = ctx.signup().await;
    let other = ctx.signup().await;
    let foreign = other.create_category("Theirs").await;

    let resp = owner
        .send_json(
            Method::POST,
            "/api/products",
            &json!({ "category_id": foreign, "name": "Cola", "price": "1.00" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_owners_cannot_see_each_other() {
    let ctx = TestContext::new();
    let alice = ctx.signup().await;
    let bob = ctx.signup().await;

    let category = alice.create_category("Private").await;
    let product = alice.create_product(category, "Secret Sauce", "9.99").await;

    for path in [
        format!("/api/categories/{category}"),
        format!("/api/products/{product}"),
        format!("/api/categories/{category}/products/sequence"),
    ] {
        let resp = bob.get(&path).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{path}");
    }

    let resp = bob.delete(&format!("/api/products/{product}")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(ids(&bob.get_json("/api/categories").await).is_empty());

    alice.get_json(&format!("/api/products/{product}")).await;
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_product_image_upload() {
    let ctx = TestContext::new();
    let owner = ctx.signup().await;
    let category = owner.create_category("Drinks").await;
    let product = owner.create_product(category, "Cola", "2.50").await;

    let upload = |bytes: &'static [u8], mime: &str| {
        let part = multipart::Part::bytes(bytes)
            .file_name("cola.png")
            .mime_str(mime)
            .expect("valid mime");
        owner
            .request(Method::POST, &format!("/api/products/{product}/image"))
            .multipart(multipart::Form::new().part("image", part))
            .send()
    };

    let resp = upload(PNG, "image/png").await.expect("upload failed");
    let body = expect_json(resp, StatusCode::OK).await;
    let image_path = body["image_path"].as_str().expect("image path").to_string();
    assert!(image_path.ends_with(".png"));

    let image = ctx
        .client
        .get(ctx.url(&format!("/images/{image_path}")))
        .send()
        .await
        .expect("image fetch failed");
    assert_eq!(image.status(), StatusCode::OK);
    assert_eq!(image.bytes().await.expect("image body").as_ref(), PNG);

    // Declared type must match the content
    let resp = upload(PNG, "image/jpeg").await.expect("upload failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let resp = upload(b"plain text", "text/plain").await.expect("upload failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_deleting_category_removes_its_products_and_images() {
    let ctx = TestContext::new();
    let owner = ctx.signup().await;
    let drinks = owner.create_category("Drinks").await;
    let food = owner.create_category("Food").await;
    let cola = owner.create_product(drinks, "Cola", "2.50").await;
    let juice = owner.create_product(drinks, "Juice", "3.00").await;
    let toast = owner.create_product(food, "Toast", "4.00").await;

    let part = multipart::Part::bytes(PNG)
        .file_name("cola.png")
        .mime_str("image/png")
        .expect("valid mime");
    let resp = owner
        .request(Method::POST, &format!("/api/products/{cola}/image"))
        .multipart(multipart::Form::new().part("image", part))
        .send()
        .await
        .expect("upload failed");
    let body = expect_json(resp, StatusCode::OK).await;
    let image_url = ctx.url(&format!(
        "/images/{}",
        body["image_path"].as_str().expect("image path")
    ));
    let fetch_image = || {
        let request = ctx.client.get(&image_url);
        async move { request.send().await.expect("image fetch failed").status() }
    };
    assert_eq!(fetch_image().await, StatusCode::OK);

    let resp = owner.delete(&format!("/api/categories/{drinks}")).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    for product in [cola, juice] {
        let resp = owner.get(&format!("/api/products/{product}")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{product}");
    }
    assert_eq!(ids(&owner.get_json("/api/products").await), [toast]);

    let resp = owner
        .get(&format!("/api/categories/{drinks}/products/sequence"))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let food_path = format!("/api/categories/{food}/products/sequence");
    assert_eq!(sequence(&owner.get_json(&food_path).await), [toast]);

    assert_eq!(fetch_image().await, StatusCode::NOT_FOUND);
}
