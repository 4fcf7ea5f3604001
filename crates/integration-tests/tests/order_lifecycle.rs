//! Order lifecycle across both services: payment notifications on the
//! storefront, fulfilment in the back office, stock effects in between.
//!
//! Orders are inserted directly because placing one through checkout needs
//! the live payment gateway.
//!
//! Run with: cargo test -p roastline-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Value, json};

use roastline_integration_tests::{
    admin_url, create_product, create_voucher, insert_order, insert_pending_order,
    register_customer, send_notification, super_admin, test_pool, variant_stock,
    voucher_used_count,
};

async fn order_action(admin: &Client, number: &str, action: &str, body: Value) -> reqwest::Response {
    admin
        .post(format!("{}/orders/{number}/{action}", admin_url()))
        .json(&body)
        .send()
        .await
        .unwrap()
}

async fn order_detail(admin: &Client, number: &str) -> Value {
    admin
        .get(format!("{}/orders/{number}", admin_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn order_status(admin: &Client, number: &str) -> String {
    order_detail(admin, number).await["status"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
#[ignore = "Requires running servers, database and payment server key"]
async fn test_paid_order_ships_and_delivers() {
    let pool = test_pool().await;
    let admin = super_admin().await;
    let customer = register_customer().await;
    let product = create_product(&admin, 120_000, 100_000, 5).await;
    let (number, total) =
        insert_pending_order(&pool, customer.id, &product, 2, Decimal::from(120_000)).await;

    // Pending orders cannot be processed
    let resp = order_action(&admin, &number, "process", json!({})).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = send_notification(&number, total, "settlement").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let ack: Value = resp.json().await.unwrap();
    assert_eq!(ack["effect"]["result"], "transitioned");
    assert_eq!(ack["effect"]["to"], "paid");
    assert_eq!(variant_stock(&admin, product.id).await, 3);

    // A replayed notification changes nothing
    let resp = send_notification(&number, total, "settlement").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let ack: Value = resp.json().await.unwrap();
    assert_eq!(ack["effect"]["result"], "recorded");
    assert_eq!(variant_stock(&admin, product.id).await, 3);

    let resp = order_action(&admin, &number, "process", json!({})).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = order_action(&admin, &number, "ship", json!({ "tracking_number": "  " })).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = order_action(&admin, &number, "ship", json!({ "tracking_number": "JNE0012345" })).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let order: Value = resp.json().await.unwrap();
    assert_eq!(order["tracking_number"], "JNE0012345");

    // Shipped orders cannot be cancelled
    let resp = order_action(&admin, &number, "cancel", json!({ "reason": "late" })).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = order_action(&admin, &number, "deliver", json!({})).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(order_status(&admin, &number).await, "delivered");
    assert_eq!(variant_stock(&admin, product.id).await, 3);
}

#[tokio::test]
#[ignore = "Requires running servers, database and payment server key"]
async fn test_cancelling_paid_order_restores_stock() {
    let pool = test_pool().await;
    let admin = super_admin().await;
    let customer = register_customer().await;
    let product = create_product(&admin, 80_000, 70_000, 10).await;
    let (number, total) =
        insert_pending_order(&pool, customer.id, &product, 4, Decimal::from(80_000)).await;

    let resp = send_notification(&number, total, "settlement").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(variant_stock(&admin, product.id).await, 6);

    let resp = order_action(&admin, &number, "cancel", json!({ "reason": "customer request" })).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let order: Value = resp.json().await.unwrap();
    assert_eq!(order["status"], "cancelled");
    assert_eq!(order["cancel_reason"], "customer request");
    assert_eq!(variant_stock(&admin, product.id).await, 10);

    // A late settlement cannot resurrect the order
    let resp = send_notification(&number, total, "settlement").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(order_status(&admin, &number).await, "cancelled");
    assert_eq!(variant_stock(&admin, product.id).await, 10);
}

#[tokio::test]
#[ignore = "Requires running servers, database and payment server key"]
async fn test_expired_payment_cancels_without_touching_stock() {
    let pool = test_pool().await;
    let admin = super_admin().await;
    let customer = register_customer().await;
    let product = create_product(&admin, 80_000, 70_000, 7).await;
    let (number, total) =
        insert_pending_order(&pool, customer.id, &product, 1, Decimal::from(80_000)).await;

    let resp = send_notification(&number, total, "expire").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(order_status(&admin, &number).await, "cancelled");
    assert_eq!(variant_stock(&admin, product.id).await, 7);
}

#[tokio::test]
#[ignore = "Requires running servers, database and payment server key"]
async fn test_late_failure_leaves_paid_order_alone() {
    let pool = test_pool().await;
    let admin = super_admin().await;
    let customer = register_customer().await;
    let product = create_product(&admin, 80_000, 70_000, 6).await;
    let (number, total) =
        insert_pending_order(&pool, customer.id, &product, 2, Decimal::from(80_000)).await;

    let resp = send_notification(&number, total, "settlement").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(variant_stock(&admin, product.id).await, 4);

    for late in ["expire", "deny", "failure", "pending"] {
        let resp = send_notification(&number, total, late).await;
        assert_eq!(resp.status(), StatusCode::OK, "{late}");
        let ack: Value = resp.json().await.unwrap();
        assert_eq!(ack["effect"]["result"], "recorded", "{late}");
    }

    let detail = order_detail(&admin, &number).await;
    assert_eq!(detail["status"], "paid");
    assert_eq!(detail["payment"]["status"], "settlement");
    assert_eq!(variant_stock(&admin, product.id).await, 4);
}

#[tokio::test]
#[ignore = "Requires running servers, database and payment server key"]
async fn test_stock_shortfall_at_payment_clamps_to_zero() {
    let pool = test_pool().await;
    let admin = super_admin().await;
    let customer = register_customer().await;
    let product = create_product(&admin, 80_000, 70_000, 2).await;
    let (number, total) =
        insert_pending_order(&pool, customer.id, &product, 5, Decimal::from(80_000)).await;

    let resp = send_notification(&number, total, "settlement").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(order_status(&admin, &number).await, "paid");
    assert_eq!(variant_stock(&admin, product.id).await, 0);
}

#[tokio::test]
#[ignore = "Requires running servers, database and payment server key"]
async fn test_voucher_consumed_at_payment_and_released_on_cancel() {
    let pool = test_pool().await;
    let admin = super_admin().await;
    let customer = register_customer().await;
    let product = create_product(&admin, 80_000, 70_000, 10).await;
    let voucher = create_voucher(&admin, 10_000, 5).await;
    let (number, total) = insert_order(
        &pool,
        customer.id,
        &product,
        2,
        Decimal::from(80_000),
        Some(&voucher),
    )
    .await;
    assert_eq!(total, Decimal::from(168_000));

    let resp = send_notification(&number, total, "settlement").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(voucher_used_count(&admin, voucher.id).await, 1);

    // Replays do not consume again
    send_notification(&number, total, "settlement").await;
    assert_eq!(voucher_used_count(&admin, voucher.id).await, 1);

    let resp = order_action(&admin, &number, "cancel", json!({})).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(voucher_used_count(&admin, voucher.id).await, 0);
}

#[tokio::test]
#[ignore = "Requires running servers, database and payment server key"]
async fn test_exhausted_voucher_is_not_released_by_cancel() {
    let pool = test_pool().await;
    let admin = super_admin().await;
    let product = create_product(&admin, 80_000, 70_000, 10).await;
    let voucher = create_voucher(&admin, 10_000, 1).await;

    let first = register_customer().await;
    let (first_number, first_total) = insert_order(
        &pool,
        first.id,
        &product,
        1,
        Decimal::from(80_000),
        Some(&voucher),
    )
    .await;
    let second = register_customer().await;
    let (second_number, second_total) = insert_order(
        &pool,
        second.id,
        &product,
        1,
        Decimal::from(80_000),
        Some(&voucher),
    )
    .await;

    send_notification(&first_number, first_total, "settlement").await;
    assert_eq!(voucher_used_count(&admin, voucher.id).await, 1);

    // The quota is full; the second order is still paid
    send_notification(&second_number, second_total, "settlement").await;
    assert_eq!(order_status(&admin, &second_number).await, "paid");
    assert_eq!(voucher_used_count(&admin, voucher.id).await, 1);

    // Cancelling the order that never took a use frees nothing
    let resp = order_action(&admin, &second_number, "cancel", json!({})).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(voucher_used_count(&admin, voucher.id).await, 1);

    let resp = order_action(&admin, &first_number, "cancel", json!({})).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(voucher_used_count(&admin, voucher.id).await, 0);
}

#[tokio::test]
#[ignore = "Requires running servers, database and payment server key"]
async fn test_tampered_amount_is_rejected() {
    let pool = test_pool().await;
    let admin = super_admin().await;
    let customer = register_customer().await;
    let product = create_product(&admin, 80_000, 70_000, 7).await;
    let (number, total) =
        insert_pending_order(&pool, customer.id, &product, 1, Decimal::from(80_000)).await;

    let resp = send_notification(&number, total - Decimal::from(1_000), "settlement").await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(order_status(&admin, &number).await, "pending");
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_unknown_order_is_not_found() {
    let admin = super_admin().await;
    let resp = order_action(&admin, "RL-20240101-NOPE00", "process", json!({})).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
