//! Database operations for the back office.
//!
//! ## Tables
//!
//! - `admin.admin_user` - Staff accounts (email, password hash, role)
//! - `admin.session` - Back-office session storage
//! - `shop.*` - The storefront's tables, managed from here
//!
//! The back office shares the storefront's pool helpers, error type and
//! order transition plumbing, so an order moved here takes exactly the same
//! stock and voucher path as one moved by a payment notification.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p roastline-cli -- migrate admin
//! ```

pub mod admin_users;
pub mod b2b_requests;
pub mod catalog;
pub mod customers;
pub mod dashboard;
pub mod orders;
pub mod stories;
pub mod vouchers;

pub use admin_users::AdminUserRepository;
pub use b2b_requests::B2bReviewRepository;
pub use catalog::CatalogRepository;
pub use customers::CustomerRepository;
pub use dashboard::DashboardRepository;
pub use orders::{OrderFilter, OrderAdminRepository};
pub use stories::StoryAdminRepository;
pub use vouchers::VoucherAdminRepository;

pub use roastline_storefront::db::{OrderTransitionError, Page, RepositoryError, create_pool};
