//! Session-related types.

use serde::{Deserialize, Serialize};

use roastline_core::{CustomerTier, Email, UserId};

use super::User;

/// Session-stored customer identity.
///
/// `tier` is a snapshot from login. Pricing-sensitive paths (cart totals,
/// checkout) re-read it from the database so a B2B approval applies at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub tier: CustomerTier,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            tier: user.tier,
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in customer.
    pub const CURRENT_USER: &str = "current_user";
}
