//! Cart models and cart pricing.

use rust_decimal::Decimal;
use serde::Serialize;

use roastline_core::{
    CustomerTier, LineInput, PricingError, ProductId, VariantId, unit_price,
};

/// A cart row joined with its variant and product.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartLine {
    pub variant_id: VariantId,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_slug: String,
    pub variant_name: String,
    pub sku: String,
    pub price: Decimal,
    pub b2b_price: Option<Decimal>,
    pub weight_grams: i32,
    pub stock: i32,
    /// Both the variant and its product are active.
    pub available: bool,
    pub quantity: i32,
}

impl CartLine {
    /// Unit price for `tier`.
    #[must_use]
    pub fn unit_price(&self, tier: CustomerTier, b2b_discount_percent: Decimal) -> Decimal {
        unit_price(tier, self.price, self.b2b_price, b2b_discount_percent)
    }

    /// The line can be bought in the requested quantity right now.
    #[must_use]
    pub const fn is_purchasable(&self) -> bool {
        self.available && self.quantity <= self.stock
    }
}

/// One priced line of the cart.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub variant_id: VariantId,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_slug: String,
    pub variant_name: String,
    pub sku: String,
    pub quantity: i32,
    pub list_price: Decimal,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub weight_grams: i32,
    pub available: bool,
    pub stock: i32,
}

/// The cart as returned by `GET /cart`.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub tier: CustomerTier,
    /// Lines at B2C list price.
    pub list_subtotal: Decimal,
    /// Lines at the customer's tier price.
    pub subtotal: Decimal,
    pub item_count: i32,
    pub total_weight_grams: i32,
}

impl CartView {
    /// Price every line for `tier`.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidQuantity`] for a line with quantity < 1.
    pub fn price(
        lines: &[CartLine],
        tier: CustomerTier,
        b2b_discount_percent: Decimal,
    ) -> Result<Self, PricingError> {
        let mut items = Vec::with_capacity(lines.len());
        let mut list_subtotal = Decimal::ZERO;
        let mut subtotal = Decimal::ZERO;

        for line in lines {
            let price = line.unit_price(tier, b2b_discount_percent);
            let line_total = LineInput {
                unit_price: price,
                quantity: line.quantity,
            }
            .line_total()?;

            list_subtotal += line.price * Decimal::from(line.quantity);
            subtotal += line_total;

            items.push(CartItemView {
                variant_id: line.variant_id,
                product_id: line.product_id,
                product_name: line.product_name.clone(),
                product_slug: line.product_slug.clone(),
                variant_name: line.variant_name.clone(),
                sku: line.sku.clone(),
                quantity: line.quantity,
                list_price: line.price,
                unit_price: price,
                line_total,
                weight_grams: line.weight_grams,
                available: line.available,
                stock: line.stock,
            });
        }

        Ok(Self {
            item_count: lines.iter().map(|l| l.quantity).sum(),
            total_weight_grams: total_weight_grams(lines),
            items,
            tier,
            list_subtotal,
            subtotal,
        })
    }

    /// Tier-priced lines in the shape [`roastline_core::OrderTotals`] expects.
    #[must_use]
    pub fn line_inputs(&self) -> Vec<LineInput> {
        self.items
            .iter()
            .map(|item| LineInput {
                unit_price: item.unit_price,
                quantity: item.quantity,
            })
            .collect()
    }
}

/// Parcel weight for shipping quotes: sum of `weight × quantity`, at least 1 g.
#[must_use]
pub fn total_weight_grams(lines: &[CartLine]) -> i32 {
    lines
        .iter()
        .map(|l| l.weight_grams.saturating_mul(l.quantity))
        .fold(0_i32, i32::saturating_add)
        .max(1)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(id: i32, price: i64, b2b_price: Option<i64>, weight: i32, qty: i32) -> CartLine {
        CartLine {
            variant_id: VariantId::new(id),
            product_id: ProductId::new(id),
            product_name: format!("Product {id}"),
            product_slug: format!("product-{id}"),
            variant_name: "250g".to_string(),
            sku: format!("SKU-{id}"),
            price: Decimal::from(price),
            b2b_price: b2b_price.map(Decimal::from),
            weight_grams: weight,
            stock: 10,
            available: true,
            quantity: qty,
        }
    }

    #[test]
    fn test_price_b2c_cart() {
        let lines = [line(1, 95_000, None, 250, 2), line(2, 60_000, None, 200, 1)];
        let cart = CartView::price(&lines, CustomerTier::B2c, Decimal::from(15)).unwrap();

        assert_eq!(cart.subtotal, Decimal::from(250_000));
        assert_eq!(cart.list_subtotal, Decimal::from(250_000));
        assert_eq!(cart.item_count, 3);
        assert_eq!(cart.total_weight_grams, 700);
    }

    #[test]
    fn test_price_b2b_cart() {
        let lines = [
            line(1, 100_000, None, 1000, 2),
            line(2, 60_000, Some(50_000), 200, 1),
        ];
        let cart = CartView::price(&lines, CustomerTier::B2b, Decimal::from(15)).unwrap();

        assert_eq!(cart.items[0].unit_price, Decimal::from(85_000));
        assert_eq!(cart.items[1].unit_price, Decimal::from(50_000));
        assert_eq!(cart.subtotal, Decimal::from(220_000));
        assert_eq!(cart.list_subtotal, Decimal::from(260_000));
    }

    #[test]
    fn test_empty_cart_weight_floor() {
        let cart = CartView::price(&[], CustomerTier::B2c, Decimal::from(15)).unwrap();
        assert_eq!(cart.total_weight_grams, 1);
        assert_eq!(cart.subtotal, Decimal::ZERO);
        assert!(cart.items.is_empty());
    }

    #[test]
    fn test_is_purchasable() {
        let mut l = line(1, 10_000, None, 100, 11);
        assert!(!l.is_purchasable());
        l.quantity = 10;
        assert!(l.is_purchasable());
        l.available = false;
        assert!(!l.is_purchasable());
    }
}
