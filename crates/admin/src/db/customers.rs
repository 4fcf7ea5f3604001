//! Customer lookup and tier management.

use rust_decimal::Decimal;
use sqlx::PgPool;

use roastline_core::{CustomerTier, OrderStatus, UserId};
use roastline_storefront::db::UserRepository;

use super::catalog::like_pattern;
use super::{Page, RepositoryError};
use crate::models::{CustomerDetail, User};

const CUSTOMER_COLUMNS: &str = "id, email, name, phone, tier, created_at, updated_at";

/// Statuses whose order totals count as revenue.
pub(crate) fn committed_statuses() -> Vec<&'static str> {
    OrderStatus::COMMITTED.into_iter().map(OrderStatus::as_str).collect()
}

pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Customers matching `query` on name or email, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        query: Option<&str>,
        tier: Option<CustomerTier>,
        page: Page,
    ) -> Result<(Vec<User>, i64), RepositoryError> {
        let pattern = like_pattern(query);

        let customers = sqlx::query_as::<_, User>(&format!(
            r"
            SELECT {CUSTOMER_COLUMNS} FROM shop.customer
            WHERE ($1::text IS NULL OR name ILIKE $1 OR email ILIKE $1)
              AND ($2::shop.customer_tier IS NULL OR tier = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "
        ))
        .bind(pattern.as_deref())
        .bind(tier)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*) FROM shop.customer
            WHERE ($1::text IS NULL OR name ILIKE $1 OR email ILIKE $1)
              AND ($2::shop.customer_tier IS NULL OR tier = $2)
            ",
        )
        .bind(pattern.as_deref())
        .bind(tier)
        .fetch_one(self.pool)
        .await?;

        Ok((customers, total))
    }

    /// A customer with their order count and lifetime spend.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn detail(&self, id: UserId) -> Result<Option<CustomerDetail>, RepositoryError> {
        let Some(customer) = UserRepository::new(self.pool).get_by_id(id).await? else {
            return Ok(None);
        };

        let (order_count, lifetime_spend) = sqlx::query_as::<_, (i64, Decimal)>(
            r"
            SELECT COUNT(*),
                   COALESCE(SUM(total) FILTER (WHERE status::text = ANY($2)), 0)
            FROM shop.customer_order
            WHERE customer_id = $1
            ",
        )
        .bind(id)
        .bind(committed_statuses())
        .fetch_one(self.pool)
        .await?;

        Ok(Some(CustomerDetail {
            customer,
            order_count,
            lifetime_spend,
        }))
    }

    /// Set a customer's pricing tier directly.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown customer.
    pub async fn set_tier(&self, id: UserId, tier: CustomerTier) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(&format!(
            r"
            UPDATE shop.customer SET tier = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {CUSTOMER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(tier)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_committed_statuses() {
        assert_eq!(
            committed_statuses(),
            vec!["paid", "processing", "shipped", "delivered"]
        );
    }
}
