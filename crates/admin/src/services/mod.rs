//! Business logic services for the back office.
//!
//! # Services
//!
//! - `auth` - Staff login and account creation
//! - `fulfilment` - Order status changes made by staff

pub mod auth;
pub mod fulfilment;
