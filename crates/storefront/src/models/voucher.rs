//! Voucher rows.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use roastline_core::{VoucherAudience, VoucherId, VoucherKind, VoucherRules};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Voucher {
    pub id: VoucherId,
    pub code: String,
    pub description: String,
    pub kind: VoucherKind,
    pub value: Decimal,
    pub max_discount: Option<Decimal>,
    pub min_subtotal: Option<Decimal>,
    pub quota: Option<i32>,
    pub used_count: i32,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub audience: VoucherAudience,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Voucher {
    #[must_use]
    pub fn rules(&self) -> VoucherRules {
        VoucherRules {
            code: self.code.clone(),
            kind: self.kind,
            value: self.value,
            max_discount: self.max_discount,
            min_subtotal: self.min_subtotal,
            quota: self.quota,
            used_count: self.used_count,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            is_active: self.is_active,
            audience: self.audience,
        }
    }
}
