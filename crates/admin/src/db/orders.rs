//! Order queries for fulfilment staff.
//!
//! Status changes are not written here: they go through the storefront's
//! `OrderRepository::transition` so stock and voucher effects stay in one
//! place.

use sqlx::PgPool;

use roastline_core::OrderStatus;
use roastline_storefront::db::{OrderRepository, TransactionRepository, UserRepository};

use super::catalog::like_pattern;
use super::{Page, RepositoryError};
use crate::models::{AdminOrderDetail, OrderListRow};

const LIST_FILTER: &str = r"
    ($1::shop.order_status IS NULL OR o.status = $1)
    AND ($2::text IS NULL OR o.order_number ILIKE $2 OR c.email ILIKE $2)
";

/// Filters for `GET /orders`.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// Matches the order number or the customer's email.
    pub query: Option<String>,
}

pub struct OrderAdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderAdminRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Orders matching `filter`, newest first, and the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &OrderFilter,
        page: Page,
    ) -> Result<(Vec<OrderListRow>, i64), RepositoryError> {
        let pattern = like_pattern(filter.query.as_deref());

        let rows = sqlx::query_as::<_, OrderListRow>(&format!(
            r"
            SELECT o.order_number, o.status, o.tier, o.total, o.created_at,
                   c.name AS customer_name, c.email AS customer_email,
                   COALESCE((SELECT SUM(i.quantity) FROM shop.order_item i WHERE i.order_id = o.id), 0)::BIGINT
                       AS item_count
            FROM shop.customer_order o
            JOIN shop.customer c ON c.id = o.customer_id
            WHERE {LIST_FILTER}
            ORDER BY o.created_at DESC, o.id DESC
            LIMIT $3 OFFSET $4
            "
        ))
        .bind(filter.status)
        .bind(pattern.as_deref())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            r"
            SELECT COUNT(*)
            FROM shop.customer_order o
            JOIN shop.customer c ON c.id = o.customer_id
            WHERE {LIST_FILTER}
            "
        ))
        .bind(filter.status)
        .bind(pattern.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok((rows, total))
    }

    /// An order with its items, payment transaction and customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails and
    /// `RepositoryError::DataCorruption` if the customer row is missing.
    pub async fn detail(
        &self,
        order_number: &str,
    ) -> Result<Option<AdminOrderDetail>, RepositoryError> {
        let orders = OrderRepository::new(self.pool);
        let Some(order) = orders.get_by_number(order_number).await? else {
            return Ok(None);
        };

        let items = orders.items(order.id).await?;
        let payment = TransactionRepository::new(self.pool)
            .get_for_order(order.id)
            .await?;
        let customer = UserRepository::new(self.pool)
            .get_by_id(order.customer_id)
            .await?
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "order {} references missing customer {}",
                    order.order_number, order.customer_id
                ))
            })?;

        Ok(Some(AdminOrderDetail {
            order,
            items,
            payment,
            customer,
        }))
    }
}
