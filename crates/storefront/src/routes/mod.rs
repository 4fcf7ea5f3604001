//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (database)
//!
//! # Auth
//! POST /auth/register                   - Create a customer and log in (rate limited)
//! POST /auth/login                      - Log in (rate limited)
//! POST /auth/logout                     - Log out
//! GET  /auth/me                         - Current customer
//!
//! # Catalog
//! GET  /products                        - Active products (?q=&category=&page=&per_page=)
//! GET  /products/{slug}                 - Product detail
//! GET  /categories                      - Distinct categories
//!
//! # Cart (requires auth)
//! GET    /cart                          - Priced cart
//! DELETE /cart                          - Empty the cart
//! POST   /cart/items                    - Add a variant
//! PATCH  /cart/items/{variant_id}       - Set quantity (0 removes)
//! DELETE /cart/items/{variant_id}       - Remove a variant
//!
//! # Shipping, vouchers, checkout
//! GET  /shipping/rates                  - Rates for every courier (?destination=&weight=)
//! POST /vouchers/validate               - Quote a voucher against the cart
//! POST /checkout                        - Place an order and get a payment token
//! POST /checkout/preview                - Price an order without placing it
//!
//! # Payment gateway
//! POST /webhooks/payment                - Payment notification
//!
//! # Account (requires auth)
//! GET    /account/orders                - Order history
//! GET    /account/orders/{number}       - Order detail
//! POST   /account/orders/{number}/cancel - Cancel a pending order
//! POST   /account/orders/{number}/pay   - New payment token for a pending order
//! GET    /account/addresses             - Address book
//! POST   /account/addresses             - Add an address
//! PUT    /account/addresses/{id}        - Update an address
//! DELETE /account/addresses/{id}        - Delete an address
//! POST   /account/addresses/{id}/default - Make an address the default
//!
//! # Business accounts (requires auth)
//! GET  /b2b/requests                    - Own upgrade requests
//! POST /b2b/requests                    - Request a business account
//!
//! # Stories
//! GET  /stories                         - Published stories
//! GET  /stories/{slug}                  - Story with rendered body
//! ```

pub mod account;
pub mod auth;
pub mod b2b;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod health;
pub mod shipping;
pub mod stories;
pub mod webhooks;

use axum::{
    Router,
    routing::{get, patch, post, put},
};
use serde::Deserialize;

use crate::db::Page;
use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// `?page=&per_page=` query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageQuery {
    #[must_use]
    pub fn page(self) -> Page {
        Page::new(self.page, self.per_page)
    }
}

/// Create the auth routes router.
///
/// Credential endpoints get the strict rate limiter.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .merge(limited)
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::index))
        .route("/{slug}", get(catalog::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route(
            "/items/{variant_id}",
            patch(cart::update).delete(cart::remove),
        )
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::place_order))
        .route("/preview", post(checkout::preview))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(account::orders))
        .route("/orders/{number}", get(account::order))
        .route("/orders/{number}/cancel", post(account::cancel_order))
        .route("/orders/{number}/pay", post(account::pay_order))
        .route(
            "/addresses",
            get(account::addresses).post(account::create_address),
        )
        .route(
            "/addresses/{id}",
            put(account::update_address).delete(account::delete_address),
        )
        .route("/addresses/{id}/default", post(account::set_default_address))
}

/// Create the story routes router.
pub fn story_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(stories::index))
        .route("/{slug}", get(stories::show))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .route("/categories", get(catalog::categories))
        .nest("/cart", cart_routes())
        .route("/shipping/rates", get(shipping::rates))
        .route("/vouchers/validate", post(checkout::validate_voucher))
        .nest("/checkout", checkout_routes())
        .route("/webhooks/payment", post(webhooks::payment))
        .nest("/account", account_routes())
        .route(
            "/b2b/requests",
            get(b2b::list_requests).post(b2b::create_request),
        )
        .nest("/stories", story_routes())
}
