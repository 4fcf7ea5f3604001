//! Catalog repository (read side).

use sqlx::PgPool;

use roastline_core::{ProductId, VariantId};

use super::{Page, RepositoryError};
use crate::models::{Product, Variant};

pub const PRODUCT_COLUMNS: &str = "p.id, p.name, p.slug, p.description, p.category, \
     p.origin, p.roast_level, p.image_url, p.is_active, p.created_at, p.updated_at";

pub const VARIANT_COLUMNS: &str = "v.id, v.product_id, v.sku, v.name, v.price, \
     v.b2b_price, v.weight_grams, v.stock, v.is_active, v.created_at, v.updated_at";

/// Filters for the public product listing.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Case-insensitive match on name, origin, or description.
    pub query: Option<String>,
    pub category: Option<String>,
}

impl ProductFilter {
    fn pattern(&self) -> Option<String> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", escape_like(q)))
    }

    fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// Escape `LIKE` wildcards in user input.
#[must_use]
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Repository for products and variants.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active products matching `filter`, newest first, and the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(
        &self,
        filter: &ProductFilter,
        page: Page,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let pattern = filter.pattern();
        let category = filter.category();

        let products = sqlx::query_as::<_, Product>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM shop.product p
            WHERE p.is_active
              AND ($1::text IS NULL OR p.name ILIKE $1 OR p.origin ILIKE $1 OR p.description ILIKE $1)
              AND ($2::text IS NULL OR p.category = $2)
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $3 OFFSET $4
            "
        ))
        .bind(pattern.as_deref())
        .bind(category)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*)
            FROM shop.product p
            WHERE p.is_active
              AND ($1::text IS NULL OR p.name ILIKE $1 OR p.origin ILIKE $1 OR p.description ILIKE $1)
              AND ($2::text IS NULL OR p.category = $2)
            ",
        )
        .bind(pattern.as_deref())
        .bind(category)
        .fetch_one(self.pool)
        .await?;

        Ok((products, total))
    }

    /// An active product by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product p WHERE p.slug = $1 AND p.is_active"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Active variants of the given products, cheapest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_variants_for(
        &self,
        product_ids: &[ProductId],
    ) -> Result<Vec<Variant>, RepositoryError> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = product_ids.iter().map(ProductId::as_i32).collect();

        let variants = sqlx::query_as::<_, Variant>(&format!(
            r"
            SELECT {VARIANT_COLUMNS}
            FROM shop.product_variant v
            WHERE v.product_id = ANY($1) AND v.is_active
            ORDER BY v.product_id, v.price, v.id
            "
        ))
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        Ok(variants)
    }

    /// A variant that is active and belongs to an active product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_purchasable_variant(
        &self,
        id: VariantId,
    ) -> Result<Option<Variant>, RepositoryError> {
        let variant = sqlx::query_as::<_, Variant>(&format!(
            r"
            SELECT {VARIANT_COLUMNS}
            FROM shop.product_variant v
            JOIN shop.product p ON p.id = v.product_id
            WHERE v.id = $1 AND v.is_active AND p.is_active
            "
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(variant)
    }

    /// Distinct categories of active products, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<String>, RepositoryError> {
        let categories = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT category FROM shop.product WHERE is_active ORDER BY category",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%_arabica\\"), "100\\%\\_arabica\\\\");
    }

    #[test]
    fn test_filter_pattern_ignores_blank() {
        let filter = ProductFilter {
            query: Some("   ".to_string()),
            category: Some(String::new()),
        };
        assert_eq!(filter.pattern(), None);
        assert_eq!(filter.category(), None);

        let filter = ProductFilter {
            query: Some(" gayo ".to_string()),
            category: Some("single-origin".to_string()),
        };
        assert_eq!(filter.pattern().as_deref(), Some("%gayo%"));
        assert_eq!(filter.category(), Some("single-origin"));
    }
}
