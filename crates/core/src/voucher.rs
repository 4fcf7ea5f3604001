//! Voucher eligibility and discount arithmetic.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CustomerTier, VoucherAudience, VoucherKind, percent_of};

/// Why a voucher cannot be applied.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VoucherError {
    #[error("voucher not found")]
    NotFound,
    #[error("voucher is no longer active")]
    Inactive,
    #[error("voucher is not valid yet")]
    NotStarted,
    #[error("voucher has expired")]
    Expired,
    #[error("voucher has been fully redeemed")]
    QuotaExhausted,
    #[error("voucher is not available for your account type")]
    AudienceMismatch,
    #[error("order subtotal must be at least {min}")]
    BelowMinimum { min: Decimal },
}

/// The redemption rules of a voucher, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherRules {
    pub code: String,
    pub kind: VoucherKind,
    /// Percentage (for [`VoucherKind::Percentage`]) or amount.
    pub value: Decimal,
    /// Cap on a percentage discount.
    pub max_discount: Option<Decimal>,
    pub min_subtotal: Option<Decimal>,
    /// Total redemptions allowed. `None` is unlimited.
    pub quota: Option<i32>,
    pub used_count: i32,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub audience: VoucherAudience,
}

impl VoucherRules {
    /// Check whether a customer of `tier` may redeem this voucher at `now`
    /// against a cart worth `subtotal`.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule, checked in the order: active flag,
    /// start, end, quota, audience, minimum subtotal.
    pub fn validate(
        &self,
        now: DateTime<Utc>,
        tier: CustomerTier,
        subtotal: Decimal,
    ) -> Result<(), VoucherError> {
        if !self.is_active {
            return Err(VoucherError::Inactive);
        }
        if self.starts_at.is_some_and(|start| now < start) {
            return Err(VoucherError::NotStarted);
        }
        if self.ends_at.is_some_and(|end| now >= end) {
            return Err(VoucherError::Expired);
        }
        if self.quota.is_some_and(|quota| self.used_count >= quota) {
            return Err(VoucherError::QuotaExhausted);
        }
        if !self.audience.admits(tier) {
            return Err(VoucherError::AudienceMismatch);
        }
        if let Some(min) = self.min_subtotal
            && subtotal < min
        {
            return Err(VoucherError::BelowMinimum { min });
        }
        Ok(())
    }

    /// Discount this voucher grants on `subtotal`.
    ///
    /// Never negative and never more than `subtotal`.
    #[must_use]
    pub fn discount_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let raw = match self.kind {
            VoucherKind::Percentage => {
                let pct = self.value.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
                let discount = percent_of(subtotal, pct);
                self.max_discount
                    .map_or(discount, |cap| discount.min(cap.max(Decimal::ZERO)))
            }
            VoucherKind::Fixed => self.value,
        };

        raw.clamp(Decimal::ZERO, subtotal)
    }
}

/// Canonical form of a voucher code as typed by a customer.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn rules() -> VoucherRules {
        VoucherRules {
            code: "NGOPI10".to_owned(),
            kind: VoucherKind::Percentage,
            value: Decimal::from(10),
            max_discount: Some(Decimal::from(25_000)),
            min_subtotal: Some(Decimal::from(100_000)),
            quota: Some(50),
            used_count: 0,
            starts_at: Some(now() - Duration::days(1)),
            ends_at: Some(now() + Duration::days(30)),
            is_active: true,
            audience: VoucherAudience::All,
        }
    }

    #[test]
    fn test_validate_ok() {
        assert_eq!(
            rules().validate(now(), CustomerTier::B2c, Decimal::from(150_000)),
            Ok(())
        );
    }

    #[test]
    fn test_validate_reports_first_failure() {
        let mut v = rules();
        v.is_active = false;
        v.used_count = 50;
        assert_eq!(
            v.validate(now(), CustomerTier::B2c, Decimal::from(150_000)),
            Err(VoucherError::Inactive)
        );
    }

    #[test]
    fn test_validate_window() {
        let mut v = rules();
        v.starts_at = Some(now() + Duration::hours(1));
        assert_eq!(
            v.validate(now(), CustomerTier::B2c, Decimal::from(150_000)),
            Err(VoucherError::NotStarted)
        );

        let mut v = rules();
        v.ends_at = Some(now());
        assert_eq!(
            v.validate(now(), CustomerTier::B2c, Decimal::from(150_000)),
            Err(VoucherError::Expired)
        );
    }

    #[test]
    fn test_validate_quota_audience_minimum() {
        let mut v = rules();
        v.used_count = 50;
        assert_eq!(
            v.validate(now(), CustomerTier::B2c, Decimal::from(150_000)),
            Err(VoucherError::QuotaExhausted)
        );

        let mut v = rules();
        v.audience = VoucherAudience::B2b;
        assert_eq!(
            v.validate(now(), CustomerTier::B2c, Decimal::from(150_000)),
            Err(VoucherError::AudienceMismatch)
        );

        assert_eq!(
            rules().validate(now(), CustomerTier::B2b, Decimal::from(99_999)),
            Err(VoucherError::BelowMinimum {
                min: Decimal::from(100_000)
            })
        );
    }

    #[test]
    fn test_unlimited_quota() {
        let mut v = rules();
        v.quota = None;
        v.used_count = 10_000;
        assert!(
            v.validate(now(), CustomerTier::B2c, Decimal::from(150_000))
                .is_ok()
        );
    }

    #[test]
    fn test_percentage_discount_capped() {
        let v = rules();
        assert_eq!(v.discount_for(Decimal::from(150_000)), Decimal::from(15_000));
        assert_eq!(v.discount_for(Decimal::from(400_000)), Decimal::from(25_000));
    }

    #[test]
    fn test_percentage_over_hundred_treated_as_hundred() {
        let mut v = rules();
        v.value = Decimal::from(150);
        v.max_discount = None;
        assert_eq!(v.discount_for(Decimal::from(80_000)), Decimal::from(80_000));
    }

    #[test]
    fn test_fixed_discount_capped_at_subtotal() {
        let mut v = rules();
        v.kind = VoucherKind::Fixed;
        v.value = Decimal::from(50_000);
        assert_eq!(v.discount_for(Decimal::from(200_000)), Decimal::from(50_000));
        assert_eq!(v.discount_for(Decimal::from(35_000)), Decimal::from(35_000));
        assert_eq!(v.discount_for(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  ngopi10 "), "NGOPI10");
    }
}
