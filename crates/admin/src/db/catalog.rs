//! Catalog management: products, variants and stock movements.

use sqlx::PgPool;
use tracing::info;

use roastline_core::{AdminUserId, ProductId, VariantId};
use roastline_storefront::db::products::{PRODUCT_COLUMNS, VARIANT_COLUMNS, escape_like};

use super::{Page, RepositoryError};
use crate::models::{Product, ProductFields, Variant, VariantInput};

/// Repository for catalog writes and back-office catalog reads.
///
/// Unlike the storefront's catalog queries, these include inactive rows.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Products matching `query` on name, slug or origin, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_products(
        &self,
        query: Option<&str>,
        page: Page,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let pattern = like_pattern(query);

        let products = sqlx::query_as::<_, Product>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM shop.product p
            WHERE ($1::text IS NULL OR p.name ILIKE $1 OR p.slug ILIKE $1 OR p.origin ILIKE $1)
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(pattern.as_deref())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*) FROM shop.product p
            WHERE ($1::text IS NULL OR p.name ILIKE $1 OR p.slug ILIKE $1 OR p.origin ILIKE $1)
            ",
        )
        .bind(pattern.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok((products, total))
    }

    /// A product by ID, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product p WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// Every variant of a product, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn variants_of(&self, product_id: ProductId) -> Result<Vec<Variant>, RepositoryError> {
        let variants = sqlx::query_as::<_, Variant>(&format!(
            r"
            SELECT {VARIANT_COLUMNS} FROM shop.product_variant v
            WHERE v.product_id = $1
            ORDER BY v.price, v.id
            "
        ))
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;
        Ok(variants)
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create_product(&self, fields: &ProductFields) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            r"
            WITH p AS (
                INSERT INTO shop.product
                    (name, slug, description, category, origin, roast_level, image_url, is_active)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING *
            )
            SELECT {PRODUCT_COLUMNS} FROM p
            "
        ))
        .bind(&fields.name)
        .bind(&fields.slug)
        .bind(&fields.description)
        .bind(&fields.category)
        .bind(fields.origin.as_deref())
        .bind(fields.roast_level.as_deref())
        .bind(fields.image_url.as_deref())
        .bind(fields.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, "product slug"))
    }

    /// Replace a product's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown product and
    /// `RepositoryError::Conflict` if the new slug is taken.
    pub async fn update_product(
        &self,
        id: ProductId,
        fields: &ProductFields,
    ) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            r"
            WITH p AS (
                UPDATE shop.product
                SET name = $2, slug = $3, description = $4, category = $5, origin = $6,
                    roast_level = $7, image_url = $8, is_active = $9, updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT {PRODUCT_COLUMNS} FROM p
            "
        ))
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.slug)
        .bind(&fields.description)
        .bind(&fields.category)
        .bind(fields.origin.as_deref())
        .bind(fields.roast_level.as_deref())
        .bind(fields.image_url.as_deref())
        .bind(fields.is_active)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, "product slug"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Hide a product from the storefront. Orders keep referencing it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown product.
    pub async fn deactivate_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.product SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Add a variant to a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown product and
    /// `RepositoryError::Conflict` if the SKU is taken.
    pub async fn create_variant(
        &self,
        product_id: ProductId,
        input: &VariantInput,
    ) -> Result<Variant, RepositoryError> {
        if self.get_product(product_id).await?.is_none() {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query_as::<_, Variant>(&format!(
            r"
            WITH v AS (
                INSERT INTO shop.product_variant
                    (product_id, sku, name, price, b2b_price, weight_grams, stock, is_active)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING *
            )
            SELECT {VARIANT_COLUMNS} FROM v
            "
        ))
        .bind(product_id)
        .bind(&input.sku)
        .bind(&input.name)
        .bind(input.price)
        .bind(input.b2b_price)
        .bind(input.weight_grams)
        .bind(input.stock)
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, "sku"))
    }

    /// Replace a variant's fields. Stock is left alone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown variant and
    /// `RepositoryError::Conflict` if the SKU is taken.
    pub async fn update_variant(
        &self,
        id: VariantId,
        input: &VariantInput,
    ) -> Result<Variant, RepositoryError> {
        sqlx::query_as::<_, Variant>(&format!(
            r"
            WITH v AS (
                UPDATE shop.product_variant
                SET sku = $2, name = $3, price = $4, b2b_price = $5, weight_grams = $6,
                    is_active = $7, updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT {VARIANT_COLUMNS} FROM v
            "
        ))
        .bind(id)
        .bind(&input.sku)
        .bind(&input.name)
        .bind(input.price)
        .bind(input.b2b_price)
        .bind(input.weight_grams)
        .bind(input.is_active)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, "sku"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Stop selling a variant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown variant.
    pub async fn deactivate_variant(&self, id: VariantId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.product_variant SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Apply a signed stock change and record it. Returns the new stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown variant and
    /// `RepositoryError::Conflict` if the stock would drop below zero or
    /// leave the integer range.
    pub async fn adjust_stock(
        &self,
        id: VariantId,
        delta: i32,
        reason: &str,
        admin_id: AdminUserId,
    ) -> Result<i32, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let stock_after = sqlx::query_scalar::<_, i32>(
            r"
            UPDATE shop.product_variant
            SET stock = stock + $2, updated_at = NOW()
            WHERE id = $1 AND stock::BIGINT + $2 BETWEEN 0 AND 2147483647
            RETURNING stock
            ",
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(stock_after) = stock_after else {
            let current =
                sqlx::query_scalar::<_, i32>("SELECT stock FROM shop.product_variant WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?;
            return Err(match current {
                Some(stock) if delta < 0 => RepositoryError::Conflict(format!(
                    "stock cannot go below zero (current stock {stock}, change {delta})"
                )),
                Some(stock) => RepositoryError::Conflict(format!(
                    "stock would exceed the maximum (current stock {stock}, change {delta})"
                )),
                None => RepositoryError::NotFound,
            });
        };

        sqlx::query(
            r"
            INSERT INTO shop.stock_adjustment (variant_id, delta, stock_after, reason, admin_user_id)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(id)
        .bind(delta)
        .bind(stock_after)
        .bind(reason)
        .bind(admin_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            variant_id = %id,
            delta,
            stock_after,
            admin_id = %admin_id,
            "Stock adjusted"
        );
        Ok(stock_after)
    }
}

/// `%query%` with `LIKE` wildcards escaped, or `None` for a blank query.
pub(crate) fn like_pattern(query: Option<&str>) -> Option<String> {
    query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(|q| format!("%{}%", escape_like(q)))
}
