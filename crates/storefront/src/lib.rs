//! Roastline storefront library.
//!
//! The public JSON API for the coffee shop: catalog, cart, checkout,
//! payment notifications and customer accounts. Exposed as a library so the
//! back office can reuse the shop repositories and the order state machine
//! plumbing.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
