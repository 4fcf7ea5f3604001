//! Voucher management bodies.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use roastline_core::{VoucherAudience, VoucherKind, is_whole_units, normalize_code};

const MIN_CODE_LEN: usize = 3;
const MAX_CODE_LEN: usize = 32;

/// Body of `POST /vouchers` and `PUT /vouchers/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct VoucherInput {
    pub code: String,
    #[serde(default)]
    pub description: String,
    pub kind: VoucherKind,
    pub value: Decimal,
    #[serde(default)]
    pub max_discount: Option<Decimal>,
    #[serde(default)]
    pub min_subtotal: Option<Decimal>,
    #[serde(default)]
    pub quota: Option<i32>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub audience: VoucherAudience,
}

impl VoucherInput {
    /// Normalize the code and check value, window and quota.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first rule that fails.
    pub fn validate(self) -> Result<Self, String> {
        let code = normalize_code(&self.code);
        validate_code(&code)?;

        match self.kind {
            VoucherKind::Percentage
                if self.value < Decimal::ONE || self.value > Decimal::ONE_HUNDRED =>
            {
                return Err("percentage value must be between 1 and 100".to_string());
            }
            VoucherKind::Fixed if self.value <= Decimal::ZERO => {
                return Err("fixed value must be greater than zero".to_string());
            }
            VoucherKind::Fixed if !is_whole_units(self.value) => {
                return Err("fixed value must be in whole currency units".to_string());
            }
            _ => {}
        }

        if [self.max_discount, self.min_subtotal]
            .into_iter()
            .flatten()
            .any(|amount| !is_whole_units(amount))
        {
            return Err("max_discount and min_subtotal must be in whole currency units".to_string());
        }

        if self.max_discount.is_some_and(|m| m <= Decimal::ZERO) {
            return Err("max_discount must be greater than zero".to_string());
        }
        if self.min_subtotal.is_some_and(|m| m < Decimal::ZERO) {
            return Err("min_subtotal cannot be negative".to_string());
        }
        if let (Some(starts), Some(ends)) = (self.starts_at, self.ends_at)
            && ends <= starts
        {
            return Err("ends_at must be after starts_at".to_string());
        }
        if self.quota.is_some_and(|q| q < 1) {
            return Err("quota must be at least 1".to_string());
        }

        Ok(Self {
            code,
            description: self.description.trim().to_string(),
            ..self
        })
    }
}

fn validate_code(code: &str) -> Result<(), String> {
    let len = code.chars().count();
    if !(MIN_CODE_LEN..=MAX_CODE_LEN).contains(&len) {
        return Err(format!(
            "code must be {MIN_CODE_LEN} to {MAX_CODE_LEN} characters"
        ));
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        return Err("code may only contain letters, digits, '-' and '_'".to_string());
    }
    Ok(())
}

const fn default_active() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn input() -> VoucherInput {
        VoucherInput {
            code: " kopi10 ".to_string(),
            description: "Ten percent off".to_string(),
            kind: VoucherKind::Percentage,
            value: Decimal::from(10),
            max_discount: Some(Decimal::from(50_000)),
            min_subtotal: None,
            quota: Some(100),
            starts_at: None,
            ends_at: None,
            is_active: true,
            audience: VoucherAudience::All,
        }
    }

    #[test]
    fn test_code_normalized() {
        assert_eq!(input().validate().unwrap().code, "KOPI10");
    }

    #[test]
    fn test_code_charset_and_length() {
        assert!(VoucherInput { code: "AB".to_string(), ..input() }.validate().is_err());
        assert!(
            VoucherInput { code: "KOPI 10".to_string(), ..input() }
                .validate()
                .is_err()
        );
        assert!(
            VoucherInput { code: "A".repeat(33), ..input() }
                .validate()
                .is_err()
        );
        assert!(
            VoucherInput { code: "new_year-24".to_string(), ..input() }
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_percentage_bounds() {
        assert!(VoucherInput { value: Decimal::ZERO, ..input() }.validate().is_err());
        assert!(VoucherInput { value: Decimal::from(101), ..input() }.validate().is_err());
        assert!(VoucherInput { value: Decimal::from(100), ..input() }.validate().is_ok());
    }

    #[test]
    fn test_fixed_value_positive() {
        let fixed = VoucherInput {
            kind: VoucherKind::Fixed,
            value: Decimal::from(250_000),
            ..input()
        };
        assert!(fixed.validate().is_ok());
        assert!(
            VoucherInput {
                kind: VoucherKind::Fixed,
                value: Decimal::ZERO,
                ..input()
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn test_amounts_must_be_whole_units() {
        let err = VoucherInput {
            kind: VoucherKind::Fixed,
            value: Decimal::new(1_000_050, 2),
            ..input()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, "fixed value must be in whole currency units");

        assert!(
            VoucherInput {
                max_discount: Some(Decimal::new(5_000_001, 2)),
                ..input()
            }
            .validate()
            .is_err()
        );
        // A fractional percentage is fine; the discount itself is rounded.
        assert!(
            VoucherInput {
                value: Decimal::new(125, 1),
                ..input()
            }
            .validate()
            .is_ok()
        );
    }

    #[test]
    fn test_window_and_quota() {
        let now = Utc::now();
        let err = VoucherInput {
            starts_at: Some(now),
            ends_at: Some(now - Duration::days(1)),
            ..input()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, "ends_at must be after starts_at");

        assert!(VoucherInput { quota: Some(0), ..input() }.validate().is_err());
    }
}
