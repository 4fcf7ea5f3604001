//! Dashboard aggregates.

use rust_decimal::Decimal;
use sqlx::PgPool;

use super::RepositoryError;
use super::customers::committed_statuses;
use crate::models::dashboard::complete_status_counts;
use crate::models::{DashboardStats, LowStockVariant, StatusCount};

/// Variants at or below this stock show up as low.
pub const LOW_STOCK_THRESHOLD: i32 = 5;

pub struct DashboardRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DashboardRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Everything `GET /dashboard` shows.
    ///
    /// Revenue is bucketed by order creation time. "Today" starts at
    /// midnight in the database session's time zone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn stats(&self) -> Result<DashboardStats, RepositoryError> {
        let counts = sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*) AS count FROM shop.customer_order GROUP BY status",
        )
        .fetch_all(self.pool)
        .await?;

        let (revenue_today, revenue_last_30_days) = sqlx::query_as::<_, (Decimal, Decimal)>(
            r"
            SELECT COALESCE(SUM(total) FILTER (WHERE created_at >= date_trunc('day', NOW())), 0),
                   COALESCE(SUM(total), 0)
            FROM shop.customer_order
            WHERE status::text = ANY($1)
              AND created_at >= NOW() - INTERVAL '30 days'
            ",
        )
        .bind(committed_statuses())
        .fetch_one(self.pool)
        .await?;

        let pending_b2b_requests = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM shop.b2b_request WHERE status = 'pending'",
        )
        .fetch_one(self.pool)
        .await?;

        let low_stock = sqlx::query_as::<_, LowStockVariant>(
            r"
            SELECT v.id AS variant_id, p.name AS product_name, v.name AS variant_name,
                   v.sku, v.stock
            FROM shop.product_variant v
            JOIN shop.product p ON p.id = v.product_id
            WHERE v.is_active AND p.is_active AND v.stock <= $1
            ORDER BY v.stock, p.name, v.id
            ",
        )
        .bind(LOW_STOCK_THRESHOLD)
        .fetch_all(self.pool)
        .await?;

        Ok(DashboardStats {
            orders_by_status: complete_status_counts(&counts),
            revenue_today,
            revenue_last_30_days,
            pending_b2b_requests,
            low_stock,
        })
    }
}
