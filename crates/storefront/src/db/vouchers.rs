//! Voucher lookups for the storefront. Writes happen in the back office.

use sqlx::PgPool;

use super::RepositoryError;
use crate::models::Voucher;

pub const VOUCHER_COLUMNS: &str = "id, code, description, kind, value, max_discount, \
     min_subtotal, quota, used_count, starts_at, ends_at, is_active, audience, created_at, \
     updated_at";

pub struct VoucherRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> VoucherRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A voucher by its normalized code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_code(&self, code: &str) -> Result<Option<Voucher>, RepositoryError> {
        let voucher = sqlx::query_as::<_, Voucher>(&format!(
            "SELECT {VOUCHER_COLUMNS} FROM shop.voucher WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(self.pool)
        .await?;
        Ok(voucher)
    }
}
