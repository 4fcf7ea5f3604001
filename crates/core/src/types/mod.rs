//! Core types for Roastline.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod order_number;
pub mod slug;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{
    CurrencyCode, format_gateway_amount, is_whole_units, percent_of, round_currency,
};
pub use order_number::{OrderNumber, OrderNumberError};
pub use slug::slugify;
pub use status::*;
