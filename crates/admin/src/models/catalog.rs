//! Request bodies for catalog management.
//!
//! Product and variant rows themselves are the shop models re-exported from
//! the storefront crate.

use rust_decimal::Decimal;
use serde::Deserialize;

use roastline_core::{is_whole_units, slugify};

/// Body of `POST /products` and `PUT /products/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    /// Derived from `name` when absent.
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub roast_level: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Validated product columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFields {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub category: String,
    pub origin: Option<String>,
    pub roast_level: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
}

impl ProductInput {
    /// Trim fields and settle the slug.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(self) -> Result<ProductFields, String> {
        let name = required("name", &self.name)?;
        let category = required("category", &self.category)?;
        let slug = slugify(self.slug.as_deref().map_or(name.as_str(), str::trim));
        if slug.is_empty() {
            return Err("slug must contain letters or digits".to_string());
        }

        Ok(ProductFields {
            name,
            slug,
            description: self.description.trim().to_string(),
            category,
            origin: optional(self.origin),
            roast_level: optional(self.roast_level),
            image_url: optional(self.image_url),
            is_active: self.is_active,
        })
    }
}

/// Body of `POST /products/{id}/variants` and `PUT /variants/{id}`.
///
/// `stock` is only read on creation. Later changes go through stock
/// adjustments so every movement is recorded.
#[derive(Debug, Clone, Deserialize)]
pub struct VariantInput {
    pub sku: String,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub b2b_price: Option<Decimal>,
    pub weight_grams: i32,
    #[serde(default)]
    pub stock: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl VariantInput {
    /// Trim text fields and check the price, weight and stock rules.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(self) -> Result<Self, String> {
        let sku = required("sku", &self.sku)?.to_uppercase();
        let name = required("name", &self.name)?;

        if self.price <= Decimal::ZERO {
            return Err("price must be greater than zero".to_string());
        }
        if !is_whole_units(self.price) {
            return Err("price must be in whole currency units".to_string());
        }
        if let Some(b2b) = self.b2b_price {
            if b2b <= Decimal::ZERO {
                return Err("b2b_price must be greater than zero".to_string());
            }
            if !is_whole_units(b2b) {
                return Err("b2b_price must be in whole currency units".to_string());
            }
            if b2b > self.price {
                return Err("b2b_price cannot exceed price".to_string());
            }
        }
        if self.weight_grams <= 0 {
            return Err("weight_grams must be greater than zero".to_string());
        }
        if self.stock < 0 {
            return Err("stock cannot be negative".to_string());
        }

        Ok(Self { sku, name, ..self })
    }
}

/// Largest stock change a single adjustment may make, in either direction.
pub const MAX_STOCK_DELTA: i32 = 1_000_000;

/// Body of `POST /variants/{id}/stock`.
#[derive(Debug, Clone, Deserialize)]
pub struct StockAdjustmentInput {
    /// Signed change, e.g. `+24` for a roast batch or `-1` for a damaged bag.
    pub delta: i32,
    pub reason: String,
}

impl StockAdjustmentInput {
    /// # Errors
    ///
    /// Returns a message for a zero or out-of-range delta, or a blank reason.
    pub fn validate(self) -> Result<Self, String> {
        if self.delta == 0 {
            return Err("delta cannot be zero".to_string());
        }
        if !(-MAX_STOCK_DELTA..=MAX_STOCK_DELTA).contains(&self.delta) {
            return Err(format!(
                "delta must be between -{MAX_STOCK_DELTA} and {MAX_STOCK_DELTA}"
            ));
        }
        let reason = required("reason", &self.reason)?;
        Ok(Self {
            delta: self.delta,
            reason,
        })
    }
}

pub(crate) fn required(name: &str, value: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        Err(format!("{name} is required"))
    } else {
        Ok(value.to_string())
    }
}

pub(crate) fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(slug: Option<&str>) -> ProductInput {
        ProductInput {
            name: " Gayo Wine Process ".to_string(),
            slug: slug.map(String::from),
            description: String::new(),
            category: "single-origin".to_string(),
            origin: Some("  ".to_string()),
            roast_level: Some("light".to_string()),
            image_url: None,
            is_active: true,
        }
    }

    fn variant() -> VariantInput {
        VariantInput {
            sku: "gayo-250-wb".to_string(),
            name: "250g Whole Bean".to_string(),
            price: Decimal::from(95_000),
            b2b_price: Some(Decimal::from(80_000)),
            weight_grams: 250,
            stock: 10,
            is_active: true,
        }
    }

    #[test]
    fn test_slug_derived_from_name() {
        let fields = product(None).validate().unwrap();
        assert_eq!(fields.name, "Gayo Wine Process");
        assert_eq!(fields.slug, "gayo-wine-process");
        assert_eq!(fields.origin, None);
    }

    #[test]
    fn test_explicit_slug_is_normalized() {
        let fields = product(Some("Gayo WP 2024")).validate().unwrap();
        assert_eq!(fields.slug, "gayo-wp-2024");

        assert!(product(Some("---")).validate().is_err());
    }

    #[test]
    fn test_variant_rules() {
        let v = variant().validate().unwrap();
        assert_eq!(v.sku, "GAYO-250-WB");

        let err = VariantInput {
            b2b_price: Some(Decimal::from(100_000)),
            ..variant()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, "b2b_price cannot exceed price");

        assert!(
            VariantInput {
                price: Decimal::ZERO,
                ..variant()
            }
            .validate()
            .is_err()
        );
        assert!(
            VariantInput {
                weight_grams: 0,
                ..variant()
            }
            .validate()
            .is_err()
        );
        assert!(VariantInput { stock: -1, ..variant() }.validate().is_err());
    }

    #[test]
    fn test_prices_must_be_whole_units() {
        let err = VariantInput {
            price: Decimal::new(9_999_950, 2),
            ..variant()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, "price must be in whole currency units");

        let err = VariantInput {
            b2b_price: Some(Decimal::new(8_000_025, 2)),
            ..variant()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, "b2b_price must be in whole currency units");

        assert!(
            VariantInput {
                price: Decimal::new(9_500_000, 2),
                ..variant()
            }
            .validate()
            .is_ok()
        );
    }

    #[test]
    fn test_stock_adjustment() {
        let adj = StockAdjustmentInput {
            delta: -2,
            reason: " damaged bags ".to_string(),
        }
        .validate()
        .unwrap();
        assert_eq!(adj.reason, "damaged bags");

        assert!(
            StockAdjustmentInput {
                delta: 0,
                reason: "recount".to_string()
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn test_stock_adjustment_delta_is_bounded() {
        for delta in [i32::MAX, i32::MIN, MAX_STOCK_DELTA + 1] {
            let err = StockAdjustmentInput {
                delta,
                reason: "recount".to_string(),
            }
            .validate()
            .unwrap_err();
            assert!(err.starts_with("delta must be between"), "{err}");
        }
        assert!(
            StockAdjustmentInput {
                delta: -MAX_STOCK_DELTA,
                reason: "write-off".to_string(),
            }
            .validate()
            .is_ok()
        );
    }
}
