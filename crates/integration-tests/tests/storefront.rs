//! Storefront API: accounts, cart stock checks and tier pricing.
//!
//! Run with: cargo test -p roastline-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Value, json};

use roastline_integration_tests::{
    CUSTOMER_PASSWORD, admin_url, client, create_product, decimal, register_customer,
    storefront_url, super_admin,
};

/// Unit price the storefront shows `client` for the product's first variant.
async fn price_for(client: &Client, slug: &str) -> Decimal {
    let view: Value = client
        .get(format!("{}/products/{slug}", storefront_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    decimal(&view["variants"][0]["price"])
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_health() {
    let resp = client()
        .get(format!("{}/health", storefront_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");

    let resp = client()
        .get(format!("{}/health/ready", storefront_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_register_me_logout() {
    let customer = register_customer().await;
    let base = storefront_url();

    let me: Value = customer
        .client
        .get(format!("{base}/auth/me"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["email"], customer.email.as_str());
    assert_eq!(me["tier"], "b2c");
    assert!(me.get("password_hash").is_none());

    let resp = customer
        .client
        .post(format!("{base}/auth/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = customer
        .client
        .get(format!("{base}/auth/me"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_duplicate_registration_conflicts() {
    let customer = register_customer().await;

    let resp = client()
        .post(format!("{}/auth/register", storefront_url()))
        .json(&json!({
            "email": customer.email.to_uppercase(),
            "password": CUSTOMER_PASSWORD,
            "name": "Someone Else",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_cart_requires_login() {
    let resp = client()
        .get(format!("{}/cart", storefront_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running storefront and admin servers"]
async fn test_cart_refuses_more_than_stock() {
    let admin = super_admin().await;
    let product = create_product(&admin, 120_000, 100_000, 3).await;
    let customer = register_customer().await;
    let base = storefront_url();

    let resp = customer
        .client
        .post(format!("{base}/cart/items"))
        .json(&json!({ "variant_id": product.variant_id, "quantity": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // 2 already in the cart, 2 more would exceed the 3 in stock
    let resp = customer
        .client
        .post(format!("{base}/cart/items"))
        .json(&json!({ "variant_id": product.variant_id, "quantity": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let cart: Value = customer
        .client
        .get(format!("{base}/cart"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["item_count"], 2);
    assert_eq!(decimal(&cart["subtotal"]), Decimal::from(240_000));
}

#[tokio::test]
#[ignore = "Requires running storefront and admin servers"]
async fn test_approved_b2b_request_switches_pricing() {
    let admin = super_admin().await;
    let product = create_product(&admin, 120_000, 100_000, 10).await;
    let customer = register_customer().await;
    let base = storefront_url();

    assert_eq!(price_for(&customer.client, &product.slug).await, Decimal::from(120_000));

    let resp = customer
        .client
        .post(format!("{base}/b2b/requests"))
        .json(&json!({
            "company_name": "Kopi Pagi",
            "business_type": "cafe",
            "phone": "081234567890",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let request: Value = resp.json().await.unwrap();

    let resp = admin
        .post(format!(
            "{}/b2b-requests/{}/approve",
            admin_url(),
            request["id"]
        ))
        .json(&json!({ "note": "verified" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // The tier is read fresh, no new login needed
    assert_eq!(price_for(&customer.client, &product.slug).await, Decimal::from(100_000));
}
