//! Database operations for the `shop` schema.
//!
//! ## Tables
//!
//! - `customer` - Storefront accounts (email, password hash, pricing tier)
//! - `address` - Shipping addresses, at most one default per customer
//! - `product` / `product_variant` - Catalog and stock
//! - `cart_item` - One row per (customer, variant)
//! - `voucher` - Discount codes and their usage counters
//! - `customer_order` / `order_item` - Orders with price and address snapshots
//! - `payment_transaction` - Gateway state for each order
//! - `b2b_request` - Applications to become a business customer
//! - `story` - Published articles
//!
//! Sessions live in `storefront.session`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p roastline-cli -- migrate storefront
//! ```
//!
//! Queries are built at runtime with `sqlx::query_as` and `FromRow` row types,
//! so building the workspace never needs a live database.

pub mod addresses;
pub mod b2b_requests;
pub mod cart;
pub mod orders;
pub mod products;
pub mod stories;
pub mod transactions;
pub mod users;
pub mod vouchers;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use addresses::AddressRepository;
pub use b2b_requests::B2bRequestRepository;
pub use cart::CartRepository;
pub use orders::{
    NewOrder, NewOrderItem, OrderRepository, OrderTransitionError, TransitionExtras,
};
pub use products::{ProductFilter, ProductRepository};
pub use stories::StoryRepository;
pub use transactions::TransactionRepository;
pub use users::UserRepository;
pub use vouchers::VoucherRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to `Conflict`, anything else to `Database`.
    #[must_use]
    pub fn from_unique_violation(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Page/offset arithmetic shared by list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub per_page: i64,
}

impl Page {
    pub const DEFAULT_PER_PAGE: i64 = 20;
    pub const MAX_PER_PAGE: i64 = 100;

    /// Clamp user-supplied paging parameters into sane bounds.
    #[must_use]
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page
                .unwrap_or(Self::DEFAULT_PER_PAGE)
                .clamp(1, Self::MAX_PER_PAGE),
        }
    }

    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    #[must_use]
    pub const fn limit(&self) -> i64 {
        self.per_page
    }
}
