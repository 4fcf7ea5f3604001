//! Roastline back-office library.
//!
//! Staff-facing JSON API: catalog and stock, order fulfilment, vouchers,
//! business account review, customers and stories. Shop rows and the order
//! state machine plumbing come from the storefront crate.
//!
//! # Security
//!
//! Staff sessions are separate from customer sessions (own cookie, own
//! table, SameSite=Strict). Bind to a private interface or serve over TLS.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
