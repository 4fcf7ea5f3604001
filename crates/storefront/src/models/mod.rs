//! Domain models for the storefront.
//!
//! Row types derive `sqlx::FromRow` and `Serialize` so repositories can return
//! them straight to handlers. Request bodies live next to the model they
//! create and carry their own validation.

pub mod address;
pub mod b2b;
pub mod cart;
pub mod order;
pub mod product;
pub mod session;
pub mod story;
pub mod user;
pub mod voucher;

pub use address::{Address, AddressInput};
pub use b2b::{B2bRequest, B2bRequestInput};
pub use cart::{CartItemView, CartLine, CartView};
pub use order::{Order, OrderDetail, OrderItem, OrderSummary, PaymentTransaction};
pub use product::{PricedVariant, Product, ProductView, Variant};
pub use session::{CurrentUser, keys as session_keys};
pub use story::{Story, StorySummary};
pub use user::User;
pub use voucher::Voucher;

/// A page of results with the total count for pagination controls.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}
