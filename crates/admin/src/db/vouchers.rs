//! Voucher management.

use sqlx::PgPool;

use roastline_core::VoucherId;
use roastline_storefront::db::vouchers::VOUCHER_COLUMNS;

use super::{Page, RepositoryError};
use crate::models::{Voucher, VoucherInput};

pub struct VoucherAdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> VoucherAdminRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All vouchers, newest first, and the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, page: Page) -> Result<(Vec<Voucher>, i64), RepositoryError> {
        let vouchers = sqlx::query_as::<_, Voucher>(&format!(
            r"
            SELECT {VOUCHER_COLUMNS} FROM shop.voucher
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM shop.voucher")
            .fetch_one(self.pool)
            .await?;

        Ok((vouchers, total))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: VoucherId) -> Result<Option<Voucher>, RepositoryError> {
        let voucher = sqlx::query_as::<_, Voucher>(&format!(
            "SELECT {VOUCHER_COLUMNS} FROM shop.voucher WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(voucher)
    }

    /// Create a voucher from validated input.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code is taken.
    pub async fn create(&self, input: &VoucherInput) -> Result<Voucher, RepositoryError> {
        sqlx::query_as::<_, Voucher>(&format!(
            r"
            INSERT INTO shop.voucher
                (code, description, kind, value, max_discount, min_subtotal, quota,
                 starts_at, ends_at, is_active, audience)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {VOUCHER_COLUMNS}
            "
        ))
        .bind(&input.code)
        .bind(&input.description)
        .bind(input.kind)
        .bind(input.value)
        .bind(input.max_discount)
        .bind(input.min_subtotal)
        .bind(input.quota)
        .bind(input.starts_at)
        .bind(input.ends_at)
        .bind(input.is_active)
        .bind(input.audience)
        .fetch_one(self.pool)
        .await
        .map_err(map_write_error)
    }

    /// Replace a voucher's rules. `used_count` is kept.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown voucher and
    /// `RepositoryError::Conflict` if the code is taken or the new quota is
    /// below the current usage.
    pub async fn update(
        &self,
        id: VoucherId,
        input: &VoucherInput,
    ) -> Result<Voucher, RepositoryError> {
        sqlx::query_as::<_, Voucher>(&format!(
            r"
            UPDATE shop.voucher
            SET code = $2, description = $3, kind = $4, value = $5, max_discount = $6,
                min_subtotal = $7, quota = $8, starts_at = $9, ends_at = $10,
                is_active = $11, audience = $12, updated_at = NOW()
            WHERE id = $1
            RETURNING {VOUCHER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&input.code)
        .bind(&input.description)
        .bind(input.kind)
        .bind(input.value)
        .bind(input.max_discount)
        .bind(input.min_subtotal)
        .bind(input.quota)
        .bind(input.starts_at)
        .bind(input.ends_at)
        .bind(input.is_active)
        .bind(input.audience)
        .fetch_optional(self.pool)
        .await
        .map_err(map_write_error)?
        .ok_or(RepositoryError::NotFound)
    }

    /// Stop accepting a voucher. Orders already using it are unaffected.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown voucher.
    pub async fn deactivate(&self, id: VoucherId) -> Result<Voucher, RepositoryError> {
        sqlx::query_as::<_, Voucher>(&format!(
            r"
            UPDATE shop.voucher SET is_active = FALSE, updated_at = NOW()
            WHERE id = $1
            RETURNING {VOUCHER_COLUMNS}
            "
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }
}

fn map_write_error(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_check_violation()
    {
        return RepositoryError::Conflict("quota cannot be below the current usage".to_string());
    }
    RepositoryError::from_unique_violation(err, "voucher code")
}
