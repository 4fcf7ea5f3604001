//! Cart repository.

use sqlx::{PgPool, Postgres, Transaction};

use roastline_core::{UserId, VariantId};

use super::RepositoryError;
use crate::models::CartLine;

const CART_LINE_QUERY: &str = r"
    SELECT c.variant_id, v.product_id, p.name AS product_name, p.slug AS product_slug,
           v.name AS variant_name, v.sku, v.price, v.b2b_price, v.weight_grams, v.stock,
           (v.is_active AND p.is_active) AS available, c.quantity
    FROM shop.cart_item c
    JOIN shop.product_variant v ON v.id = c.variant_id
    JOIN shop.product p ON p.id = v.product_id
    WHERE c.customer_id = $1
    ORDER BY c.created_at, c.id
";

/// Repository for cart items.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All lines in a customer's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, customer_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let lines = sqlx::query_as::<_, CartLine>(CART_LINE_QUERY)
            .bind(customer_id)
            .fetch_all(self.pool)
            .await?;
        Ok(lines)
    }

    /// Quantity of a variant already in the cart (0 if absent).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn quantity_of(
        &self,
        customer_id: UserId,
        variant_id: VariantId,
    ) -> Result<i32, RepositoryError> {
        let quantity = sqlx::query_scalar::<_, i32>(
            "SELECT quantity FROM shop.cart_item WHERE customer_id = $1 AND variant_id = $2",
        )
        .bind(customer_id)
        .bind(variant_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(quantity.unwrap_or(0))
    }

    /// Insert or overwrite the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_quantity(
        &self,
        customer_id: UserId,
        variant_id: VariantId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO shop.cart_item (customer_id, variant_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (customer_id, variant_id)
            DO UPDATE SET quantity = EXCLUDED.quantity, updated_at = NOW()
            ",
        )
        .bind(customer_id)
        .bind(variant_id)
        .bind(quantity)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Remove one line. Returns whether a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(
        &self,
        customer_id: UserId,
        variant_id: VariantId,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM shop.cart_item WHERE customer_id = $1 AND variant_id = $2")
                .bind(customer_id)
                .bind(variant_id)
                .execute(self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, customer_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM shop.cart_item WHERE customer_id = $1")
            .bind(customer_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Empty the cart inside an open transaction (checkout).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear_in(
        tx: &mut Transaction<'_, Postgres>,
        customer_id: UserId,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM shop.cart_item WHERE customer_id = $1")
            .bind(customer_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}
