//! Customer views.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use roastline_core::CustomerTier;
use roastline_storefront::models::User;

/// Body of `GET /customers/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerDetail {
    #[serde(flatten)]
    pub customer: User,
    pub order_count: i64,
    /// Sum of totals of paid or later orders, excluding cancellations.
    pub lifetime_spend: Decimal,
}

/// Body of `POST /customers/{id}/tier`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SetTierRequest {
    pub tier: CustomerTier,
}
