//! HTTP route handlers for the back office.
//!
//! Reads need any admin session. Writes need a role that can write; viewers
//! get 403. Staff account management is super-admin only.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (database)
//!
//! # Auth
//! POST /auth/login                      - Log in (rate limited)
//! POST /auth/logout                     - Log out
//! GET  /auth/me                         - Current admin
//!
//! # Staff accounts (super admin)
//! GET    /admin-users                   - All staff accounts
//! POST   /admin-users                   - Create a staff account
//! DELETE /admin-users/{id}              - Delete a staff account (not yourself)
//!
//! GET  /dashboard                       - Order counts, revenue, queues
//!
//! # Catalog
//! GET    /products                      - Products (?q=&page=&per_page=)
//! POST   /products                      - Create a product
//! GET    /products/{id}                 - Product with all variants
//! PUT    /products/{id}                 - Replace a product
//! DELETE /products/{id}                 - Deactivate a product
//! POST   /products/{id}/variants        - Add a variant
//! PUT    /variants/{id}                 - Replace a variant (stock untouched)
//! DELETE /variants/{id}                 - Deactivate a variant
//! POST   /variants/{id}/stock           - Audited stock adjustment
//!
//! # Orders
//! GET  /orders                          - Orders (?status=&q=&page=&per_page=)
//! GET  /orders/{number}                 - Order with items, payment, customer
//! POST /orders/{number}/process         - Paid → Processing
//! POST /orders/{number}/ship            - Paid/Processing → Shipped (tracking number)
//! POST /orders/{number}/deliver         - Shipped → Delivered
//! POST /orders/{number}/cancel          - Cancel (releases stock and voucher)
//!
//! # Vouchers
//! GET    /vouchers                      - All vouchers
//! POST   /vouchers                      - Create a voucher
//! GET    /vouchers/{id}                 - One voucher
//! PUT    /vouchers/{id}                 - Replace a voucher
//! POST   /vouchers/{id}/deactivate      - Stop accepting a voucher
//!
//! # Business accounts
//! GET  /b2b-requests                    - Requests (?status=&page=&per_page=)
//! GET  /b2b-requests/{id}               - One request
//! POST /b2b-requests/{id}/approve       - Approve and upgrade the customer
//! POST /b2b-requests/{id}/reject        - Reject
//!
//! # Customers
//! GET  /customers                       - Customers (?q=&tier=&page=&per_page=)
//! GET  /customers/{id}                  - Customer with order totals
//! POST /customers/{id}/tier             - Set the pricing tier
//!
//! # Stories
//! GET    /stories                       - All stories, drafts included
//! POST   /stories                       - Create a draft
//! GET    /stories/{id}                  - One story
//! PUT    /stories/{id}                  - Replace a story
//! DELETE /stories/{id}                  - Delete a story
//! POST   /stories/{id}/publish          - Publish
//! POST   /stories/{id}/unpublish        - Back to draft
//! ```

pub mod admin_users;
pub mod auth;
pub mod b2b_requests;
pub mod catalog;
pub mod customers;
pub mod dashboard;
pub mod health;
pub mod orders;
pub mod stories;
pub mod vouchers;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::db::Page;
use crate::middleware::auth_rate_limiter;
use crate::models::Paginated;
use crate::state::AppState;

pub use roastline_storefront::routes::PageQuery;

fn paginated<T>(items: Vec<T>, total: i64, page: Page) -> Paginated<T> {
    Paginated {
        items,
        page: page.page,
        per_page: page.per_page,
        total,
    }
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/login", post(auth::login))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .merge(limited)
}

/// Create the staff account routes router.
pub fn admin_user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin_users::index).post(admin_users::create))
        .route("/{id}", axum::routing::delete(admin_users::delete))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::index).post(catalog::create))
        .route(
            "/{id}",
            get(catalog::show)
                .put(catalog::update)
                .delete(catalog::deactivate),
        )
        .route("/{id}/variants", post(catalog::create_variant))
}

/// Create the variant routes router.
pub fn variant_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            put(catalog::update_variant).delete(catalog::deactivate_variant),
        )
        .route("/{id}/stock", post(catalog::adjust_stock))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{number}", get(orders::show))
        .route("/{number}/process", post(orders::process))
        .route("/{number}/ship", post(orders::ship))
        .route("/{number}/deliver", post(orders::deliver))
        .route("/{number}/cancel", post(orders::cancel))
}

/// Create the voucher routes router.
pub fn voucher_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(vouchers::index).post(vouchers::create))
        .route("/{id}", get(vouchers::show).put(vouchers::update))
        .route("/{id}/deactivate", post(vouchers::deactivate))
}

/// Create the business account review routes router.
pub fn b2b_request_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(b2b_requests::index))
        .route("/{id}", get(b2b_requests::show))
        .route("/{id}/approve", post(b2b_requests::approve))
        .route("/{id}/reject", post(b2b_requests::reject))
}

/// Create the customer routes router.
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(customers::index))
        .route("/{id}", get(customers::show))
        .route("/{id}/tier", post(customers::set_tier))
}

/// Create the story routes router.
pub fn story_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(stories::index).post(stories::create))
        .route(
            "/{id}",
            get(stories::show)
                .put(stories::update)
                .delete(stories::delete),
        )
        .route("/{id}/publish", post(stories::publish))
        .route("/{id}/unpublish", post(stories::unpublish))
}

/// Create all routes for the back office.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/auth", auth_routes())
        .nest("/admin-users", admin_user_routes())
        .route("/dashboard", get(dashboard::show))
        .nest("/products", product_routes())
        .nest("/variants", variant_routes())
        .nest("/orders", order_routes())
        .nest("/vouchers", voucher_routes())
        .nest("/b2b-requests", b2b_request_routes())
        .nest("/customers", customer_routes())
        .nest("/stories", story_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::AdminConfig;

    fn test_app() -> Router {
        let config = AdminConfig {
            database_url: SecretString::from("postgres://localhost/roastline_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            base_url: "http://localhost:3001".to_string(),
            session_secret: SecretString::from("k8Jf2mQx9Lp4Rz7Wc1Vb6Nh3Td5Ys0Ga"),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
            tls: None,
        };
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/roastline_test")
            .unwrap();
        routes().with_state(AppState::new(config, pool))
    }

    async fn status_of(method: &str, uri: &str) -> StatusCode {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        test_app().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_health_needs_no_session() {
        assert_eq!(status_of("GET", "/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_routes_reject_anonymous() {
        for (method, uri) in [
            ("GET", "/dashboard"),
            ("GET", "/orders"),
            ("POST", "/orders/RL-20240601-ABCD/ship"),
            ("POST", "/vouchers/1/deactivate"),
            ("GET", "/admin-users"),
            ("POST", "/stories/1/publish"),
        ] {
            assert_eq!(
                status_of(method, uri).await,
                StatusCode::UNAUTHORIZED,
                "{method} {uri}"
            );
        }
    }
}
