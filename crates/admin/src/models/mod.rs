//! Domain models for the back office.
//!
//! Shop rows (orders, products, vouchers, stories, customers) are the
//! storefront's models. This module adds staff accounts, request bodies with
//! their validation, and the read models behind list and dashboard views.

pub mod admin_user;
pub mod catalog;
pub mod customer;
pub mod dashboard;
pub mod order;
pub mod session;
pub mod story;
pub mod voucher;

pub use admin_user::{AdminRole, AdminUser};
pub use catalog::{ProductFields, ProductInput, StockAdjustmentInput, VariantInput};
pub use customer::{CustomerDetail, SetTierRequest};
pub use dashboard::{DashboardStats, LowStockVariant, StatusCount};
pub use order::{AdminOrderDetail, CancelRequest, OrderListRow, ShipRequest};
pub use session::{CurrentAdmin, keys as session_keys};
pub use story::StoryInput;
pub use voucher::VoucherInput;

pub use roastline_storefront::models::{
    B2bRequest, Order, Paginated, Product, Story, User, Variant, Voucher,
};
