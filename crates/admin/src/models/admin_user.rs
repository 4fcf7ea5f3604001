//! Back-office staff accounts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use roastline_core::{AdminUserId, Email};

pub use roastline_core::AdminRole;

/// A staff account (domain type). The password hash never leaves the
/// repository except through the login path.
#[derive(Debug, Clone, Serialize)]
pub struct AdminUser {
    pub id: AdminUserId,
    pub email: Email,
    pub name: String,
    pub role: AdminRole,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
