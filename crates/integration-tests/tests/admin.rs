//! Back-office API: roles, catalog, vouchers, business accounts, stories.
//!
//! Run with: cargo test -p roastline-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};

use roastline_integration_tests::{
    admin_login, admin_url, client, create_product, register_customer, storefront_url,
    super_admin, unique, variant_stock,
};

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_anonymous_requests_are_rejected() {
    for path in ["/dashboard", "/orders", "/products", "/admin-users"] {
        let resp = client()
            .get(format!("{}{path}", admin_url()))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{path}");
        let body: Value = resp.json().await.unwrap();
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_wrong_password_is_unauthorized() {
    let resp = client()
        .post(format!("{}/auth/login", admin_url()))
        .json(&json!({ "email": "nobody@roastline.test", "password": "not-the-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_viewer_can_read_but_not_write() {
    let admin = super_admin().await;
    let email = format!("viewer-{}@roastline.test", unique());
    let password = "viewer-password-123";

    let resp = admin
        .post(format!("{}/admin-users", admin_url()))
        .json(&json!({
            "email": email,
            "name": "Read Only",
            "role": "viewer",
            "password": password,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = resp.json().await.unwrap();

    let viewer = admin_login(&email, password).await;
    let resp = viewer
        .get(format!("{}/dashboard", admin_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = viewer
        .post(format!("{}/products", admin_url()))
        .json(&json!({ "name": "Nope", "category": "blend" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = viewer
        .get(format!("{}/admin-users", admin_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = admin
        .delete(format!("{}/admin-users/{}", admin_url(), created["id"]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_super_admin_cannot_delete_self() {
    let admin = super_admin().await;
    let me: Value = admin
        .get(format!("{}/auth/me", admin_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let resp = admin
        .delete(format!("{}/admin-users/{}", admin_url(), me["id"]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_duplicate_slug_conflicts() {
    let admin = super_admin().await;
    let product = create_product(&admin, 90_000, 80_000, 0).await;

    let resp = admin
        .post(format!("{}/products", admin_url()))
        .json(&json!({
            "name": "Another Name",
            "slug": product.slug,
            "category": "blend",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_variant_validation() {
    let admin = super_admin().await;
    let product = create_product(&admin, 90_000, 80_000, 0).await;

    let resp = admin
        .post(format!("{}/products/{}/variants", admin_url(), product.id))
        .json(&json!({
            "sku": format!("bad-{}", unique()),
            "name": "1 kg",
            "price": "300000",
            "b2b_price": "310000",
            "weight_grams": 1000,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_stock_adjustment_cannot_go_negative() {
    let admin = super_admin().await;
    let product = create_product(&admin, 90_000, 80_000, 4).await;
    let url = format!("{}/variants/{}/stock", admin_url(), product.variant_id);

    let resp = admin
        .post(&url)
        .json(&json!({ "delta": 20, "reason": "roast batch" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let level: Value = resp.json().await.unwrap();
    assert_eq!(level["stock"], 24);

    let resp = admin
        .post(&url)
        .json(&json!({ "delta": -25, "reason": "miscount" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(variant_stock(&admin, product.id).await, 24);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_voucher_lifecycle() {
    let admin = super_admin().await;
    let code = format!("t{}", unique());

    let resp = admin
        .post(format!("{}/vouchers", admin_url()))
        .json(&json!({ "code": code, "kind": "percentage", "value": "150" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = admin
        .post(format!("{}/vouchers", admin_url()))
        .json(&json!({ "code": code, "kind": "percentage", "value": "10", "quota": 50 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let voucher: Value = resp.json().await.unwrap();
    assert_eq!(voucher["code"], code.to_uppercase());

    let resp = admin
        .post(format!("{}/vouchers", admin_url()))
        .json(&json!({ "code": code, "kind": "fixed", "value": "5000" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = admin
        .post(format!("{}/vouchers/{}/deactivate", admin_url(), voucher["id"]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let voucher: Value = resp.json().await.unwrap();
    assert_eq!(voucher["is_active"], false);
}

#[tokio::test]
#[ignore = "Requires running storefront and admin servers"]
async fn test_b2b_request_can_only_be_reviewed_once() {
    let admin = super_admin().await;
    let customer = register_customer().await;

    let request: Value = customer
        .client
        .post(format!("{}/b2b/requests", storefront_url()))
        .json(&json!({
            "company_name": "Roemah Kopi",
            "business_type": "reseller",
            "phone": "081298765432",
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let base = format!("{}/b2b-requests/{}", admin_url(), request["id"]);

    let resp = admin
        .post(format!("{base}/reject"))
        .json(&json!({ "note": "no business license" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let reviewed: Value = resp.json().await.unwrap();
    assert_eq!(reviewed["status"], "rejected");

    let resp = admin.post(format!("{base}/approve")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let detail: Value = admin
        .get(format!("{}/customers/{}", admin_url(), customer.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["tier"], "b2c");
}

#[tokio::test]
#[ignore = "Requires running storefront and admin servers"]
async fn test_published_story_appears_on_storefront() {
    let admin = super_admin().await;
    let title = format!("Harvest notes {}", unique());

    let resp = admin
        .post(format!("{}/stories", admin_url()))
        .json(&json!({ "title": title, "body_markdown": "# Flores\n\nCherries are **ripe**." }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let story: Value = resp.json().await.unwrap();
    let slug = story["slug"].as_str().unwrap().to_string();
    let public_url = format!("{}/stories/{slug}", storefront_url());

    let resp = client().get(&public_url).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = admin
        .post(format!("{}/stories/{}/publish", admin_url(), story["id"]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let view: Value = client().get(&public_url).send().await.unwrap().json().await.unwrap();
    assert!(view["body_html"].as_str().unwrap().contains("<strong>ripe</strong>"));
}
