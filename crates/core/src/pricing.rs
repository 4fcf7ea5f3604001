//! Tier-aware pricing and order totals.
//!
//! Every money figure a customer sees (cart, checkout preview, the order
//! itself) is produced by the functions here, so the storefront and admin
//! never disagree about a total.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::{CustomerTier, percent_of, round_currency};

/// Errors from pricing a set of lines.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("quantity must be at least 1")]
    InvalidQuantity,
}

/// Price one unit of a variant for a customer tier.
///
/// B2C customers pay `price`. B2B customers pay the variant's explicit
/// `b2b_price` when one is set, otherwise `price` less the store-wide
/// `b2b_discount_percent` (clamped to 0..=100). The result is in whole
/// units, so every total built from it can be charged as-is.
///
/// ```
/// use rust_decimal::Decimal;
/// use roastline_core::{CustomerTier, unit_price};
///
/// let price = Decimal::from(120_000);
/// let b2b = unit_price(CustomerTier::B2b, price, None, Decimal::from(15));
/// assert_eq!(b2b, Decimal::from(102_000));
/// ```
#[must_use]
pub fn unit_price(
    tier: CustomerTier,
    price: Decimal,
    b2b_price: Option<Decimal>,
    b2b_discount_percent: Decimal,
) -> Decimal {
    let price = round_currency(price);
    match tier {
        CustomerTier::B2c => price,
        CustomerTier::B2b => b2b_price.map_or_else(
            || {
                let pct = b2b_discount_percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
                price - percent_of(price, pct)
            },
            round_currency,
        ),
    }
}

/// One priced line of a cart or order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineInput {
    /// Tier-resolved unit price.
    pub unit_price: Decimal,
    pub quantity: i32,
}

impl LineInput {
    /// `unit_price × quantity`.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidQuantity`] if `quantity < 1`.
    pub fn line_total(&self) -> Result<Decimal, PricingError> {
        if self.quantity < 1 {
            return Err(PricingError::InvalidQuantity);
        }
        Ok(self.unit_price * Decimal::from(self.quantity))
    }
}

/// Breakdown of an order's total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    /// Sum of tier-priced lines.
    pub subtotal: Decimal,
    /// What the tier saved against list price.
    pub tier_discount: Decimal,
    pub voucher_discount: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// Compute totals from tier-priced lines.
    ///
    /// `list_subtotal` is the same lines at B2C list price. The voucher
    /// discount is clamped into `0..=subtotal`, so the total never drops
    /// below the shipping cost. Discount and shipping are rounded to whole
    /// units.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidQuantity`] if any line has a quantity
    /// below 1.
    pub fn compute(
        lines: &[LineInput],
        list_subtotal: Decimal,
        voucher_discount: Decimal,
        shipping: Decimal,
    ) -> Result<Self, PricingError> {
        let subtotal = lines
            .iter()
            .map(LineInput::line_total)
            .sum::<Result<Decimal, _>>()?;

        let tier_discount = (list_subtotal - subtotal).max(Decimal::ZERO);
        let voucher_discount = round_currency(voucher_discount).clamp(Decimal::ZERO, subtotal);
        let shipping = round_currency(shipping.max(Decimal::ZERO));
        let total = (subtotal - voucher_discount + shipping).max(Decimal::ZERO);

        Ok(Self {
            subtotal,
            tier_discount,
            voucher_discount,
            shipping,
            total,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn idr(n: i64) -> Decimal {
        Decimal::from(n)
    }

    #[test]
    fn test_unit_price_b2c_ignores_b2b_price() {
        assert_eq!(
            unit_price(CustomerTier::B2c, idr(95_000), Some(idr(80_000)), idr(15)),
            idr(95_000)
        );
    }

    #[test]
    fn test_unit_price_b2b_prefers_explicit_price() {
        assert_eq!(
            unit_price(CustomerTier::B2b, idr(95_000), Some(idr(80_000)), idr(15)),
            idr(80_000)
        );
    }

    #[test]
    fn test_unit_price_b2b_percentage_rounds_half_up() {
        // 10% of 99,995 = 9,999.5 -> 10,000
        assert_eq!(
            unit_price(CustomerTier::B2b, idr(99_995), None, idr(10)),
            idr(89_995)
        );
    }

    #[test]
    fn test_unit_price_clamps_percentage() {
        assert_eq!(
            unit_price(CustomerTier::B2b, idr(50_000), None, idr(150)),
            Decimal::ZERO
        );
        assert_eq!(
            unit_price(CustomerTier::B2b, idr(50_000), None, idr(-5)),
            idr(50_000)
        );
    }

    #[test]
    fn test_unit_price_is_whole_units() {
        let cents = Decimal::new(9_999_950, 2);
        assert_eq!(unit_price(CustomerTier::B2c, cents, None, idr(15)), idr(100_000));
        assert_eq!(
            unit_price(CustomerTier::B2b, idr(100_000), Some(Decimal::new(8_000_049, 2)), idr(15)),
            idr(80_000)
        );
    }

    #[test]
    fn test_fractional_shipping_and_discount_give_whole_total() {
        let lines = [LineInput {
            unit_price: idr(99_999),
            quantity: 1,
        }];
        let totals = OrderTotals::compute(
            &lines,
            idr(99_999),
            Decimal::new(1_000_050, 2),
            Decimal::new(1_800_050, 2),
        )
        .unwrap();

        assert_eq!(totals.voucher_discount, idr(10_001));
        assert_eq!(totals.shipping, idr(18_001));
        assert_eq!(totals.total, idr(107_999));
        assert!(crate::types::is_whole_units(totals.total));
    }

    #[test]
    fn test_compute_totals() {
        let lines = [
            LineInput {
                unit_price: idr(102_000),
                quantity: 2,
            },
            LineInput {
                unit_price: idr(68_000),
                quantity: 1,
            },
        ];
        let totals = OrderTotals::compute(&lines, idr(320_000), idr(20_000), idr(18_000)).unwrap();

        assert_eq!(totals.subtotal, idr(272_000));
        assert_eq!(totals.tier_discount, idr(48_000));
        assert_eq!(totals.voucher_discount, idr(20_000));
        assert_eq!(totals.total, idr(270_000));
    }

    #[test]
    fn test_voucher_discount_clamped_to_subtotal() {
        let lines = [LineInput {
            unit_price: idr(30_000),
            quantity: 1,
        }];
        let totals = OrderTotals::compute(&lines, idr(30_000), idr(50_000), idr(9_000)).unwrap();

        assert_eq!(totals.voucher_discount, idr(30_000));
        assert_eq!(totals.total, idr(9_000));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let lines = [LineInput {
            unit_price: idr(30_000),
            quantity: 0,
        }];
        assert_eq!(
            OrderTotals::compute(&lines, idr(0), idr(0), idr(0)),
            Err(PricingError::InvalidQuantity)
        );
    }
}
