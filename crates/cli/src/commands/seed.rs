//! Seed the catalog from a YAML file.
//!
//! Products are upserted by slug and variants by SKU, all in one
//! transaction. Stock is only set when a variant is first created; later
//! runs leave it alone so seeding never overwrites real stock counts.
//!
//! ```yaml
//! products:
//!   - name: Gayo Wine Process
//!     category: single-origin
//!     origin: Aceh, Indonesia
//!     roast_level: light
//!     variants:
//!       - sku: GAYO-WP-250
//!         name: 250 g
//!         price: 125000
//!         b2b_price: 105000
//!         weight_grams: 250
//!         stock: 40
//! ```

use std::path::Path;

use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use thiserror::Error;
use tracing::info;

use roastline_admin::db;
use roastline_admin::models::{ProductFields, ProductInput, VariantInput};
use roastline_core::ProductId;

use super::{MissingDatabaseUrl, database_url};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    MissingEnvVar(#[from] MissingDatabaseUrl),

    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{context}: {message}")]
    Invalid { context: String, message: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
struct SeedProduct {
    #[serde(flatten)]
    product: ProductInput,
    #[serde(default)]
    variants: Vec<VariantInput>,
}

/// A catalog entry after validation.
#[derive(Debug)]
struct ValidProduct {
    fields: ProductFields,
    variants: Vec<VariantInput>,
}

/// What a seed run did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub products: usize,
    pub variants: usize,
    pub deactivated: u64,
}

/// Seed products and variants from `file_path`.
///
/// With `clear`, every product and variant is deactivated first, so the
/// file becomes the active catalog. Rows are never deleted because orders
/// reference them.
///
/// # Errors
///
/// Returns `SeedError` if the file is unreadable or invalid, or a database
/// write fails. Nothing is written when any entry is invalid.
pub async fn catalog(file_path: &str, clear: bool) -> Result<SeedSummary, SeedError> {
    let url = database_url("STOREFRONT_DATABASE_URL")?;

    let content = tokio::fs::read_to_string(Path::new(file_path))
        .await
        .map_err(|source| SeedError::Io {
            path: file_path.to_string(),
            source,
        })?;
    let catalog = parse_catalog(&content)?;
    info!(path = %file_path, products = catalog.len(), "Catalog file validated");

    let pool = db::create_pool(&url).await?;
    let summary = write_catalog(&pool, &catalog, clear).await?;

    info!(
        products = summary.products,
        variants = summary.variants,
        deactivated = summary.deactivated,
        "Catalog seeded"
    );
    Ok(summary)
}

fn parse_catalog(content: &str) -> Result<Vec<ValidProduct>, SeedError> {
    let file: CatalogFile = serde_yaml::from_str(content)?;

    file.products
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let label = format!("products[{index}] ({})", entry.product.name.trim());
            let fields = entry.product.validate().map_err(|message| SeedError::Invalid {
                context: label.clone(),
                message,
            })?;
            let variants = entry
                .variants
                .into_iter()
                .map(|v| {
                    let sku = v.sku.clone();
                    v.validate().map_err(|message| SeedError::Invalid {
                        context: format!("{label} variant {sku}"),
                        message,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ValidProduct { fields, variants })
        })
        .collect()
}

async fn write_catalog(
    pool: &PgPool,
    catalog: &[ValidProduct],
    clear: bool,
) -> Result<SeedSummary, SeedError> {
    let mut tx = pool.begin().await?;
    let mut summary = SeedSummary::default();

    if clear {
        sqlx::query("UPDATE shop.product_variant SET is_active = FALSE, updated_at = NOW()")
            .execute(&mut *tx)
            .await?;
        summary.deactivated = sqlx::query(
            "UPDATE shop.product SET is_active = FALSE, updated_at = NOW() WHERE is_active",
        )
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    for entry in catalog {
        let product_id = upsert_product(&mut tx, &entry.fields).await?;
        for variant in &entry.variants {
            upsert_variant(&mut tx, product_id, variant).await?;
        }
        summary.products += 1;
        summary.variants += entry.variants.len();
    }

    tx.commit().await?;
    Ok(summary)
}

async fn upsert_product(
    conn: &mut PgConnection,
    fields: &ProductFields,
) -> Result<ProductId, sqlx::Error> {
    sqlx::query_scalar::<_, ProductId>(
        r"
        INSERT INTO shop.product
            (name, slug, description, category, origin, roast_level, image_url, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (slug) DO UPDATE
        SET name = EXCLUDED.name, description = EXCLUDED.description,
            category = EXCLUDED.category, origin = EXCLUDED.origin,
            roast_level = EXCLUDED.roast_level, image_url = EXCLUDED.image_url,
            is_active = EXCLUDED.is_active, updated_at = NOW()
        RETURNING id
        ",
    )
    .bind(&fields.name)
    .bind(&fields.slug)
    .bind(&fields.description)
    .bind(&fields.category)
    .bind(fields.origin.as_deref())
    .bind(fields.roast_level.as_deref())
    .bind(fields.image_url.as_deref())
    .bind(fields.is_active)
    .fetch_one(conn)
    .await
}

async fn upsert_variant(
    conn: &mut PgConnection,
    product_id: ProductId,
    variant: &VariantInput,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
        INSERT INTO shop.product_variant
            (product_id, sku, name, price, b2b_price, weight_grams, stock, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (sku) DO UPDATE
        SET product_id = EXCLUDED.product_id, name = EXCLUDED.name,
            price = EXCLUDED.price, b2b_price = EXCLUDED.b2b_price,
            weight_grams = EXCLUDED.weight_grams, is_active = EXCLUDED.is_active,
            updated_at = NOW()
        ",
    )
    .bind(product_id)
    .bind(&variant.sku)
    .bind(&variant.name)
    .bind(variant.price)
    .bind(variant.b2b_price)
    .bind(variant.weight_grams)
    .bind(variant.stock)
    .bind(variant.is_active)
    .execute(conn)
    .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    const CATALOG: &str = r"
products:
  - name: Gayo Wine Process
    category: single-origin
    origin: Aceh, Indonesia
    variants:
      - sku: gayo-wp-250
        name: 250 g
        price: 125000
        b2b_price: 105000
        weight_grams: 250
        stock: 40
      - sku: GAYO-WP-1000
        name: 1 kg
        price: 430000
        weight_grams: 1000
  - name: House Espresso
    slug: house-espresso
    category: blend
";

    #[test]
    fn test_parse_catalog() {
        let catalog = parse_catalog(CATALOG).unwrap();
        assert_eq!(catalog.len(), 2);

        let gayo = &catalog[0];
        assert_eq!(gayo.fields.slug, "gayo-wine-process");
        assert!(gayo.fields.is_active);
        assert_eq!(gayo.variants.len(), 2);
        assert_eq!(gayo.variants[0].sku, "GAYO-WP-250");
        assert_eq!(gayo.variants[0].b2b_price, Some(Decimal::from(105_000)));
        assert_eq!(gayo.variants[1].stock, 0);

        assert!(catalog[1].variants.is_empty());
    }

    #[test]
    fn test_invalid_variant_names_its_location() {
        let yaml = r"
products:
  - name: Toraja
    category: single-origin
    variants:
      - sku: TOR-250
        name: 250 g
        price: 100000
        b2b_price: 120000
        weight_grams: 250
";
        let err = parse_catalog(yaml).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("products[0] (Toraja) variant TOR-250"), "{message}");
        assert!(message.contains("b2b_price"), "{message}");
    }

    #[test]
    fn test_fractional_price_is_rejected() {
        let yaml = r"
products:
  - name: Kintamani
    category: single-origin
    variants:
      - sku: KIN-250
        name: 250 g
        price: 99999.50
        weight_grams: 250
";
        let message = parse_catalog(yaml).unwrap_err().to_string();
        assert!(message.contains("variant KIN-250"), "{message}");
        assert!(message.contains("whole currency units"), "{message}");
    }

    #[test]
    fn test_missing_category_is_rejected() {
        let yaml = "products:\n  - name: Kintamani\n    category: '  '\n";
        assert!(matches!(
            parse_catalog(yaml),
            Err(SeedError::Invalid { .. })
        ));
    }
}
