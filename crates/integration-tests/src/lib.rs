//! End-to-end tests for Roastline.
//!
//! The tests drive running servers over HTTP and set up the few rows the API
//! cannot create (orders) directly in the database. They are `#[ignore]`d by
//! default.
//!
//! # Running Tests
//!
//! ```bash
//! rl-cli migrate all
//! ADMIN_PASSWORD='...' rl-cli admin create -e qa@roastline.test -n QA -r super_admin
//! cargo run -p roastline-storefront &
//! cargo run -p roastline-admin &
//! TEST_ADMIN_EMAIL=qa@roastline.test TEST_ADMIN_PASSWORD='...' \
//!     cargo test -p roastline-integration-tests -- --ignored --test-threads=1
//! ```
//!
//! # Environment Variables
//!
//! - `TEST_STOREFRONT_URL` (default `http://localhost:3000`)
//! - `TEST_ADMIN_URL` (default `http://localhost:3001`)
//! - `TEST_DATABASE_URL`, falling back to `DATABASE_URL`
//! - `TEST_ADMIN_EMAIL`, `TEST_ADMIN_PASSWORD` - an existing super admin
//! - `TEST_PAYMENT_SERVER_KEY` - the storefront's `PAYMENT_SERVER_KEY`

#![allow(clippy::missing_panics_doc)]
#![allow(clippy::unwrap_used)]

use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use sqlx::PgPool;

pub const CUSTOMER_PASSWORD: &str = "correct-horse-battery";

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| panic!("{key} must be set for integration tests"))
}

#[must_use]
pub fn storefront_url() -> String {
    env_or("TEST_STOREFRONT_URL", "http://localhost:3000")
}

#[must_use]
pub fn admin_url() -> String {
    env_or("TEST_ADMIN_URL", "http://localhost:3001")
}

#[must_use]
pub fn payment_server_key() -> String {
    required_env("TEST_PAYMENT_SERVER_KEY")
}

/// A client that keeps session cookies between requests.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// A short random suffix for unique emails, slugs and SKUs.
#[must_use]
pub fn unique() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..10].to_string()
}

pub async fn test_pool() -> PgPool {
    let url = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("TEST_DATABASE_URL or DATABASE_URL must be set");
    PgPool::connect(&url).await.expect("Failed to connect to test database")
}

/// Parse a decimal the API serialized as a JSON string.
#[must_use]
pub fn decimal(value: &Value) -> Decimal {
    value
        .as_str()
        .unwrap_or_else(|| panic!("expected a decimal string, got {value}"))
        .parse()
        .unwrap()
}

/// A registered, logged-in storefront customer.
pub struct Customer {
    pub client: Client,
    pub id: i32,
    pub email: String,
}

pub async fn register_customer() -> Customer {
    let client = client();
    let email = format!("customer-{}@roastline.test", unique());

    let resp = client
        .post(format!("{}/auth/register", storefront_url()))
        .json(&json!({
            "email": email,
            "password": CUSTOMER_PASSWORD,
            "name": "Test Customer",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let user: Value = resp.json().await.unwrap();
    Customer {
        client,
        id: i32::try_from(user["id"].as_i64().unwrap()).unwrap(),
        email,
    }
}

/// A back-office client logged in with `email` and `password`.
pub async fn admin_login(email: &str, password: &str) -> Client {
    let client = client();
    let resp = client
        .post(format!("{}/auth/login", admin_url()))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK, "admin login for {email}");
    client
}

/// A back-office client logged in as the configured super admin.
pub async fn super_admin() -> Client {
    admin_login(
        &required_env("TEST_ADMIN_EMAIL"),
        &required_env("TEST_ADMIN_PASSWORD"),
    )
    .await
}

/// A product created through the back office with one variant.
pub struct TestProduct {
    pub id: i64,
    pub slug: String,
    pub variant_id: i64,
    pub sku: String,
}

pub async fn create_product(admin: &Client, price: u32, b2b_price: u32, stock: i32) -> TestProduct {
    let suffix = unique();

    let resp = admin
        .post(format!("{}/products", admin_url()))
        .json(&json!({
            "name": format!("Test Roast {suffix}"),
            "category": "single-origin",
            "origin": "Flores, Indonesia",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let product: Value = resp.json().await.unwrap();
    let id = product["id"].as_i64().unwrap();

    let resp = admin
        .post(format!("{}/products/{id}/variants", admin_url()))
        .json(&json!({
            "sku": format!("t-{suffix}-250"),
            "name": "250 g",
            "price": price.to_string(),
            "b2b_price": b2b_price.to_string(),
            "weight_grams": 250,
            "stock": stock,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let variant: Value = resp.json().await.unwrap();

    TestProduct {
        id,
        slug: product["slug"].as_str().unwrap().to_string(),
        variant_id: variant["id"].as_i64().unwrap(),
        sku: variant["sku"].as_str().unwrap().to_string(),
    }
}

/// Current stock of the product's first variant, read through the back office.
pub async fn variant_stock(admin: &Client, product_id: i64) -> i64 {
    let detail: Value = admin
        .get(format!("{}/products/{product_id}", admin_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    detail["variants"][0]["stock"].as_i64().unwrap()
}

/// A fixed-value voucher created through the back office.
pub struct TestVoucher {
    pub id: i64,
    pub code: String,
    pub value: Decimal,
}

pub async fn create_voucher(admin: &Client, value: u32, quota: i32) -> TestVoucher {
    let code = format!("T{}", unique().to_uppercase());
    let resp = admin
        .post(format!("{}/vouchers", admin_url()))
        .json(&json!({
            "code": code,
            "kind": "fixed",
            "value": value.to_string(),
            "quota": quota,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let voucher: Value = resp.json().await.unwrap();

    TestVoucher {
        id: voucher["id"].as_i64().unwrap(),
        code,
        value: Decimal::from(value),
    }
}

/// How many times the voucher has been redeemed, read through the back office.
pub async fn voucher_used_count(admin: &Client, voucher_id: i64) -> i64 {
    let voucher: Value = admin
        .get(format!("{}/vouchers/{voucher_id}", admin_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    voucher["used_count"].as_i64().unwrap()
}

/// Insert a pending order for one line of `product`. Returns the order
/// number and total.
pub async fn insert_pending_order(
    pool: &PgPool,
    customer_id: i32,
    product: &TestProduct,
    quantity: i32,
    unit_price: Decimal,
) -> (String, Decimal) {
    insert_order(pool, customer_id, product, quantity, unit_price, None).await
}

/// Like [`insert_pending_order`], with `voucher` applied to the order.
pub async fn insert_order(
    pool: &PgPool,
    customer_id: i32,
    product: &TestProduct,
    quantity: i32,
    unit_price: Decimal,
    voucher: Option<&TestVoucher>,
) -> (String, Decimal) {
    let order_number = format!("RL-20240601-{}", unique()[..6].to_uppercase());
    let subtotal = unit_price * Decimal::from(quantity);
    let shipping = Decimal::from(18_000);
    let discount = voucher.map_or(Decimal::ZERO, |v| v.value.min(subtotal));
    let total = subtotal - discount + shipping;

    let order_id: i32 = sqlx::query_scalar(
        r"
        INSERT INTO shop.customer_order
            (order_number, customer_id, tier, subtotal, voucher_discount, shipping_cost,
             total, voucher_id, voucher_code, courier, courier_service, recipient_name,
             phone, street, city, province, postal_code)
        VALUES ($1, $2, 'b2c', $3, $4, $5, $6, $7, $8, 'jne', 'REG', 'Test Customer',
                '081234567890', 'Jl. Braga 1', 'Bandung', 'Jawa Barat', '40111')
        RETURNING id
        ",
    )
    .bind(&order_number)
    .bind(customer_id)
    .bind(subtotal)
    .bind(discount)
    .bind(shipping)
    .bind(total)
    .bind(voucher.map(|v| i32::try_from(v.id).unwrap()))
    .bind(voucher.map(|v| v.code.as_str()))
    .fetch_one(pool)
    .await
    .unwrap();

    sqlx::query(
        r"
        INSERT INTO shop.order_item
            (order_id, product_id, variant_id, product_name, variant_name, sku,
             unit_price, quantity, line_total)
        VALUES ($1, $2, $3, 'Test Roast', '250 g', $4, $5, $6, $7)
        ",
    )
    .bind(order_id)
    .bind(i32::try_from(product.id).unwrap())
    .bind(i32::try_from(product.variant_id).unwrap())
    .bind(&product.sku)
    .bind(unit_price)
    .bind(quantity)
    .bind(subtotal)
    .execute(pool)
    .await
    .unwrap();

    (order_number, total)
}

/// Send a signed gateway notification to the storefront webhook.
pub async fn send_notification(
    order_number: &str,
    total: Decimal,
    transaction_status: &str,
) -> reqwest::Response {
    let gross_amount = format!("{total:.2}");
    let status_code = "200";
    let signature = roastline_core::payment::expected_signature(
        order_number,
        status_code,
        &gross_amount,
        &payment_server_key(),
    );

    client()
        .post(format!("{}/webhooks/payment", storefront_url()))
        .json(&json!({
            "order_id": order_number,
            "status_code": status_code,
            "gross_amount": gross_amount,
            "signature_key": signature,
            "transaction_status": transaction_status,
            "transaction_id": format!("tx-{}", unique()),
            "payment_type": "bank_transfer",
        }))
        .send()
        .await
        .unwrap()
}
