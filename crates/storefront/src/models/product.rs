//! Catalog models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use roastline_core::{CustomerTier, ProductId, VariantId, unit_price};

/// A coffee (or merchandise) product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub category: String,
    /// Growing region, e.g. "Gayo, Aceh".
    pub origin: Option<String>,
    pub roast_level: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A purchasable size/grind of a product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Variant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub sku: String,
    pub name: String,
    pub price: Decimal,
    pub b2b_price: Option<Decimal>,
    pub weight_grams: i32,
    pub stock: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A variant as shown to a particular customer.
#[derive(Debug, Clone, Serialize)]
pub struct PricedVariant {
    pub id: VariantId,
    pub sku: String,
    pub name: String,
    /// B2C list price.
    pub list_price: Decimal,
    /// What this customer pays.
    pub price: Decimal,
    pub weight_grams: i32,
    pub stock: i32,
    pub in_stock: bool,
}

impl PricedVariant {
    #[must_use]
    pub fn new(variant: &Variant, tier: CustomerTier, b2b_discount_percent: Decimal) -> Self {
        Self {
            id: variant.id,
            sku: variant.sku.clone(),
            name: variant.name.clone(),
            list_price: variant.price,
            price: unit_price(tier, variant.price, variant.b2b_price, b2b_discount_percent),
            weight_grams: variant.weight_grams,
            stock: variant.stock,
            in_stock: variant.stock > 0,
        }
    }
}

/// A product with its tier-priced active variants.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub variants: Vec<PricedVariant>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn variant(b2b_price: Option<Decimal>, stock: i32) -> Variant {
        Variant {
            id: VariantId::new(1),
            product_id: ProductId::new(1),
            sku: "GAYO-250-WB".to_string(),
            name: "250g Whole Bean".to_string(),
            price: Decimal::from(95_000),
            b2b_price,
            weight_grams: 250,
            stock,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_priced_variant_for_tiers() {
        let v = variant(None, 3);
        let b2c = PricedVariant::new(&v, CustomerTier::B2c, Decimal::from(15));
        assert_eq!(b2c.price, Decimal::from(95_000));
        assert!(b2c.in_stock);

        let b2b = PricedVariant::new(&v, CustomerTier::B2b, Decimal::from(15));
        assert_eq!(b2b.price, Decimal::from(80_750));
        assert_eq!(b2b.list_price, Decimal::from(95_000));
    }

    #[test]
    fn test_priced_variant_out_of_stock() {
        let v = variant(Some(Decimal::from(79_000)), 0);
        let priced = PricedVariant::new(&v, CustomerTier::B2b, Decimal::from(15));
        assert_eq!(priced.price, Decimal::from(79_000));
        assert!(!priced.in_stock);
    }
}
