//! Money arithmetic helpers.
//!
//! Amounts are plain [`Decimal`]s in the store currency. Prices in IDR carry
//! no meaningful fractional part, so every derived amount (discounts, tier
//! prices) is rounded half-up to whole units.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// ISO 4217 currency the store transacts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyCode {
    /// Indonesian Rupiah.
    #[default]
    Idr,
    Usd,
}

impl CurrencyCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idr => "IDR",
            Self::Usd => "USD",
        }
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = super::ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "IDR" => Ok(Self::Idr),
            "USD" => Ok(Self::Usd),
            _ => Err(super::ParseStatusError {
                kind: "currency",
                value: s.to_owned(),
            }),
        }
    }
}

/// Round to whole currency units, halves away from zero.
///
/// ```
/// use rust_decimal::Decimal;
/// use roastline_core::round_currency;
///
/// assert_eq!(round_currency(Decimal::new(125_005, 1)), Decimal::from(12_501));
/// ```
#[must_use]
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Whether `amount` has no fractional part.
///
/// Every price, voucher value and order total is stored in whole units, since
/// the gateway only accepts integer amounts.
#[must_use]
pub fn is_whole_units(amount: Decimal) -> bool {
    amount.fract().is_zero()
}

/// `percent`% of `amount`, rounded to whole units.
#[must_use]
pub fn percent_of(amount: Decimal, percent: Decimal) -> Decimal {
    round_currency(amount * percent / Decimal::ONE_HUNDRED)
}

/// Render an amount the way the payment gateway signs it: two decimals.
///
/// ```
/// use rust_decimal::Decimal;
/// use roastline_core::format_gateway_amount;
///
/// assert_eq!(format_gateway_amount(Decimal::from(150_000)), "150000.00");
/// ```
#[must_use]
pub fn format_gateway_amount(amount: Decimal) -> String {
    let mut amount = amount.round_dp(2);
    amount.rescale(2);
    amount.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_currency_half_up() {
        assert_eq!(round_currency(Decimal::new(995, 1)), Decimal::from(100));
        assert_eq!(round_currency(Decimal::new(994, 1)), Decimal::from(99));
        assert_eq!(round_currency(Decimal::new(-15, 1)), Decimal::from(-2));
    }

    #[test]
    fn test_is_whole_units() {
        assert!(is_whole_units(Decimal::from(95_000)));
        assert!(is_whole_units(Decimal::new(9_500_000, 2)));
        assert!(!is_whole_units(Decimal::new(9_999_950, 2)));
    }

    #[test]
    fn test_percent_of() {
        // 15% of 85,000 is 12,750
        assert_eq!(
            percent_of(Decimal::from(85_000), Decimal::from(15)),
            Decimal::from(12_750)
        );
        // 12.5% of 99 = 12.375 -> 12
        assert_eq!(
            percent_of(Decimal::from(99), Decimal::new(125, 1)),
            Decimal::from(12)
        );
        assert_eq!(percent_of(Decimal::from(1_000), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_format_gateway_amount() {
        assert_eq!(format_gateway_amount(Decimal::new(1_234_505, 1)), "123450.50");
        assert_eq!(format_gateway_amount(Decimal::new(99_999, 0)), "99999.00");
        assert_eq!(format_gateway_amount(Decimal::new(10, 3)), "0.01");
    }

    #[test]
    fn test_currency_code_parse() {
        assert_eq!("idr".parse::<CurrencyCode>(), Ok(CurrencyCode::Idr));
        assert_eq!(CurrencyCode::default().to_string(), "IDR");
        assert!("EUR".parse::<CurrencyCode>().is_err());
    }
}
