//! Roastline Core - Shared domain types and business rules.
//!
//! This crate provides the types and rules used across all Roastline components:
//! - `storefront` - Public JSON API (catalog, cart, checkout, payment webhook)
//! - `admin` - Back-office JSON API (fulfilment, catalog, vouchers, B2B review)
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Everything here can be unit tested without a
//! running Postgres or payment gateway.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, money, statuses, slugs, order numbers
//! - [`pricing`] - Tier-aware unit prices and order totals
//! - [`voucher`] - Voucher validation and discount arithmetic
//! - [`order`] - Order status state machine and its stock effects
//! - [`payment`] - Payment gateway notification verification and mapping

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod order;
pub mod payment;
pub mod pricing;
pub mod types;
pub mod voucher;

pub use order::{StockEffect, TransitionError};
pub use payment::{
    FraudStatus, GatewayStatus, Notification, PaymentOutcome, SignatureError, UnknownStatus,
};
pub use pricing::{LineInput, OrderTotals, PricingError, unit_price};
pub use types::*;
pub use voucher::{VoucherError, VoucherRules, normalize_code};
