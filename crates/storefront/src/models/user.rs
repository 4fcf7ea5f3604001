//! Customer accounts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use roastline_core::{CustomerTier, Email, UserId};

/// A storefront customer.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub phone: Option<String>,
    pub tier: CustomerTier,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
