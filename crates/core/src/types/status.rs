//! Status and classification enums stored as Postgres enums.
//!
//! Each enum serializes as `snake_case` both in JSON and in the database, so
//! the strings an API client sees are the same ones a SQL console shows.

use serde::{Deserialize, Serialize};

/// Error returned when a status string is not part of the enum's vocabulary.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseStatusError {
    /// Human name of the enum being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl ParseStatusError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Lifecycle of a customer order.
///
/// Allowed moves between states live in [`crate::order`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed, waiting for the payment gateway.
    #[default]
    Pending,
    /// Payment captured; stock has been deducted.
    Paid,
    /// Being roasted and packed.
    Processing,
    /// Handed to the courier.
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Paid,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Statuses that count toward revenue.
    pub const COMMITTED: [Self; 4] = [Self::Paid, Self::Processing, Self::Shipped, Self::Delivered];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError::new("order status", s))
    }
}

/// Pricing tier of a customer account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.customer_tier", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum CustomerTier {
    /// Retail customer paying list price.
    #[default]
    B2c,
    /// Approved business customer (cafes, offices, resellers).
    B2b,
}

impl std::fmt::Display for CustomerTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::B2c => write!(f, "b2c"),
            Self::B2b => write!(f, "b2b"),
        }
    }
}

impl std::str::FromStr for CustomerTier {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "b2c" => Ok(Self::B2c),
            "b2b" => Ok(Self::B2b),
            _ => Err(ParseStatusError::new("customer tier", s)),
        }
    }
}

/// How a voucher's `value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.voucher_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum VoucherKind {
    /// `value` is a percentage of the subtotal.
    Percentage,
    /// `value` is an amount in store currency.
    Fixed,
}

impl std::fmt::Display for VoucherKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Percentage => write!(f, "percentage"),
            Self::Fixed => write!(f, "fixed"),
        }
    }
}

impl std::str::FromStr for VoucherKind {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(Self::Percentage),
            "fixed" => Ok(Self::Fixed),
            _ => Err(ParseStatusError::new("voucher kind", s)),
        }
    }
}

/// Which customer tiers may redeem a voucher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.voucher_audience", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum VoucherAudience {
    #[default]
    All,
    B2c,
    B2b,
}

impl VoucherAudience {
    /// Whether a customer of `tier` is eligible.
    #[must_use]
    pub const fn admits(self, tier: CustomerTier) -> bool {
        matches!(
            (self, tier),
            (Self::All, _) | (Self::B2c, CustomerTier::B2c) | (Self::B2b, CustomerTier::B2b)
        )
    }
}

impl std::fmt::Display for VoucherAudience {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::B2c => write!(f, "b2c"),
            Self::B2b => write!(f, "b2b"),
        }
    }
}

impl std::str::FromStr for VoucherAudience {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "b2c" => Ok(Self::B2c),
            "b2b" => Ok(Self::B2b),
            _ => Err(ParseStatusError::new("voucher audience", s)),
        }
    }
}

/// Review state of a request to become a business customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.b2b_request_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum B2bRequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for B2bRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for B2bRequestStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseStatusError::new("b2b request status", s)),
        }
    }
}

/// Admin role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "admin.admin_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Everything, including managing other admin accounts.
    SuperAdmin,
    /// Catalog, fulfilment, vouchers and customer management.
    Admin,
    /// Read-only access.
    Viewer,
}

impl AdminRole {
    /// Whether this role may perform mutating back-office actions.
    #[must_use]
    pub const fn can_write(self) -> bool {
        !matches!(self, Self::Viewer)
    }
}

impl std::fmt::Display for AdminRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SuperAdmin => write!(f, "super_admin"),
            Self::Admin => write!(f, "admin"),
            Self::Viewer => write!(f, "viewer"),
        }
    }
}

impl std::str::FromStr for AdminRole {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "viewer" => Ok(Self::Viewer),
            _ => Err(ParseStatusError::new("admin role", s)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_display_matches_serde() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
            assert_eq!(status.to_string().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_status_rejected() {
        let err = "refunded".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.to_string(), "invalid order status: refunded");
        assert!("gold".parse::<CustomerTier>().is_err());
    }

    #[test]
    fn test_voucher_audience_admits() {
        assert!(VoucherAudience::All.admits(CustomerTier::B2b));
        assert!(VoucherAudience::B2c.admits(CustomerTier::B2c));
        assert!(!VoucherAudience::B2c.admits(CustomerTier::B2b));
        assert!(!VoucherAudience::B2b.admits(CustomerTier::B2c));
    }

    #[test]
    fn test_admin_role_can_write() {
        assert!(AdminRole::SuperAdmin.can_write());
        assert!(AdminRole::Admin.can_write());
        assert!(!AdminRole::Viewer.can_write());
        assert_eq!("super_admin".parse::<AdminRole>().unwrap(), AdminRole::SuperAdmin);
    }
}
