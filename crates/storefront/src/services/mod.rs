//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Customer registration and password login
//! - `cart` - Cart changes with stock checks
//! - `checkout` - Order placement, voucher quotes, payment retries
//! - `markdown` - Story body rendering
//! - `payment` - Hosted-payment token requests to the gateway
//! - `shipping` - Courier rate lookups with caching
//! - `webhook` - Gateway notification verification and application

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod markdown;
pub mod payment;
pub mod shipping;
pub mod webhook;
