//! Order repository and the persisted side of the order state machine.
//!
//! [`OrderRepository::apply_transition`] is the one place that writes a new
//! order status. The payment webhook, customer cancellation and the
//! back-office fulfilment endpoints all go through it, always on an order row
//! locked with [`OrderRepository::lock_by_number`].

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, warn};

use roastline_core::{
    CustomerTier, OrderId, OrderStatus, OrderTotals, ProductId, StockEffect, TransitionError,
    UserId, VariantId, VoucherId,
};

use super::{Page, RepositoryError};
use crate::models::{Address, Order, OrderItem, OrderSummary};

pub const ORDER_COLUMNS: &str = "o.id, o.order_number, o.customer_id, o.status, o.tier, \
     o.subtotal, o.tier_discount, o.voucher_discount, o.shipping_cost, o.total, o.voucher_id, \
     o.voucher_code, o.courier, o.courier_service, o.tracking_number, o.recipient_name, o.phone, \
     o.street, o.city, o.province, o.postal_code, o.notes, o.cancel_reason, o.paid_at, \
     o.shipped_at, o.delivered_at, o.cancelled_at, o.created_at, o.updated_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, variant_id, product_name, variant_name, \
     sku, unit_price, quantity, line_total";

/// Everything needed to write a new PENDING order.
#[derive(Debug)]
pub struct NewOrder<'a> {
    pub order_number: &'a str,
    pub customer_id: UserId,
    pub tier: CustomerTier,
    pub totals: &'a OrderTotals,
    pub voucher: Option<(VoucherId, &'a str)>,
    pub courier: &'a str,
    pub courier_service: &'a str,
    pub address: &'a Address,
    pub notes: Option<&'a str>,
}

/// A purchased line, priced at checkout.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub product_name: String,
    pub variant_name: String,
    pub sku: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

/// Optional data recorded with a transition.
#[derive(Debug, Clone, Default)]
pub struct TransitionExtras {
    pub tracking_number: Option<String>,
    pub cancel_reason: Option<String>,
}

/// Failure to move an order to a new status.
#[derive(Debug, thiserror::Error)]
pub enum OrderTransitionError {
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for OrderTransitionError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

/// Repository for orders and order items.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order and its items inside the checkout transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on an order number collision.
    pub async fn insert_in(
        tx: &mut Transaction<'_, Postgres>,
        order: &NewOrder<'_>,
        items: &[NewOrderItem],
    ) -> Result<Order, RepositoryError> {
        let (voucher_id, voucher_code) = order.voucher.unzip();

        let inserted = sqlx::query_as::<_, Order>(&format!(
            r"
            WITH o AS (
                INSERT INTO shop.customer_order
                    (order_number, customer_id, tier, subtotal, tier_discount, voucher_discount,
                     shipping_cost, total, voucher_id, voucher_code, courier, courier_service,
                     recipient_name, phone, street, city, province, postal_code, notes)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                        $17, $18, $19)
                RETURNING *
            )
            SELECT {ORDER_COLUMNS} FROM o
            "
        ))
        .bind(order.order_number)
        .bind(order.customer_id)
        .bind(order.tier)
        .bind(order.totals.subtotal)
        .bind(order.totals.tier_discount)
        .bind(order.totals.voucher_discount)
        .bind(order.totals.shipping)
        .bind(order.totals.total)
        .bind(voucher_id)
        .bind(voucher_code)
        .bind(order.courier)
        .bind(order.courier_service)
        .bind(&order.address.recipient_name)
        .bind(&order.address.phone)
        .bind(&order.address.street)
        .bind(&order.address.city)
        .bind(&order.address.province)
        .bind(&order.address.postal_code)
        .bind(order.notes)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, "order number"))?;

        for item in items {
            sqlx::query(
                r"
                INSERT INTO shop.order_item
                    (order_id, product_id, variant_id, product_name, variant_name, sku,
                     unit_price, quantity, line_total)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ",
            )
            .bind(inserted.id)
            .bind(item.product_id)
            .bind(item.variant_id)
            .bind(&item.product_name)
            .bind(&item.variant_name)
            .bind(&item.sku)
            .bind(item.unit_price)
            .bind(item.quantity)
            .bind(item.line_total)
            .execute(&mut **tx)
            .await?;
        }

        Ok(inserted)
    }

    /// A customer's orders, newest first, and the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_customer(
        &self,
        customer_id: UserId,
        page: Page,
    ) -> Result<(Vec<OrderSummary>, i64), RepositoryError> {
        let orders = sqlx::query_as::<_, OrderSummary>(
            r"
            SELECT o.order_number, o.status, o.total, o.created_at,
                   COALESCE((SELECT SUM(i.quantity) FROM shop.order_item i WHERE i.order_id = o.id), 0)::BIGINT
                       AS item_count
            FROM shop.customer_order o
            WHERE o.customer_id = $1
            ORDER BY o.created_at DESC, o.id DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(customer_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM shop.customer_order WHERE customer_id = $1",
        )
        .bind(customer_id)
        .fetch_one(self.pool)
        .await?;

        Ok((orders, total))
    }

    /// An order by number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_number(&self, order_number: &str) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.customer_order o WHERE o.order_number = $1"
        ))
        .bind(order_number)
        .fetch_optional(self.pool)
        .await?;
        Ok(order)
    }

    /// An order by number, only if `customer_id` placed it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_customer(
        &self,
        customer_id: UserId,
        order_number: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM shop.customer_order o
            WHERE o.order_number = $1 AND o.customer_id = $2
            "
        ))
        .bind(order_number)
        .bind(customer_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(order)
    }

    /// Items of an order in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM shop.order_item WHERE order_id = $1 ORDER BY id"
        ))
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;
        Ok(items)
    }

    /// Lock an order row for the rest of the transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lock_by_number(
        tx: &mut Transaction<'_, Postgres>,
        order_number: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM shop.customer_order o
            WHERE o.order_number = $1
            FOR UPDATE
            "
        ))
        .bind(order_number)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(order)
    }

    /// Move a locked order to `next`, applying its stock and voucher effects.
    ///
    /// # Errors
    ///
    /// Returns `OrderTransitionError::Transition` if the state machine refuses
    /// the move. Nothing is written in that case.
    pub async fn apply_transition(
        tx: &mut Transaction<'_, Postgres>,
        order: &Order,
        next: OrderStatus,
        extras: &TransitionExtras,
    ) -> Result<Order, OrderTransitionError> {
        let effect = order.status.transition(next)?;

        match effect {
            StockEffect::Deduct => {
                deduct_stock(tx, order).await?;
                if let Some(voucher_id) = order.voucher_id {
                    consume_voucher(tx, order, voucher_id).await?;
                }
            }
            StockEffect::Restore => {
                restore_stock(tx, order.id).await?;
                if order.voucher_id.is_some() {
                    release_voucher(tx, order).await?;
                }
            }
            StockEffect::None => {}
        }

        let updated = sqlx::query_as::<_, Order>(&format!(
            r"
            WITH o AS (
                UPDATE shop.customer_order
                SET status = $2,
                    paid_at = CASE WHEN $3 THEN NOW() ELSE paid_at END,
                    shipped_at = CASE WHEN $4 THEN NOW() ELSE shipped_at END,
                    delivered_at = CASE WHEN $5 THEN NOW() ELSE delivered_at END,
                    cancelled_at = CASE WHEN $6 THEN NOW() ELSE cancelled_at END,
                    tracking_number = COALESCE($7, tracking_number),
                    cancel_reason = COALESCE($8, cancel_reason),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT {ORDER_COLUMNS} FROM o
            "
        ))
        .bind(order.id)
        .bind(next)
        .bind(next == OrderStatus::Paid)
        .bind(next == OrderStatus::Shipped)
        .bind(next == OrderStatus::Delivered)
        .bind(next == OrderStatus::Cancelled)
        .bind(extras.tracking_number.as_deref())
        .bind(extras.cancel_reason.as_deref())
        .fetch_one(&mut **tx)
        .await?;

        info!(
            order_number = %order.order_number,
            from = %order.status,
            to = %next,
            ?effect,
            "Order status changed"
        );

        Ok(updated)
    }

    /// Lock, transition and commit in one call.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` (wrapped) for an unknown order and
    /// `OrderTransitionError::Transition` for a refused move.
    pub async fn transition(
        &self,
        order_number: &str,
        next: OrderStatus,
        extras: &TransitionExtras,
    ) -> Result<Order, OrderTransitionError> {
        let mut tx = self.pool.begin().await?;

        let order = Self::lock_by_number(&mut tx, order_number)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let updated = Self::apply_transition(&mut tx, &order, next, extras).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Cancel a customer's own order while it is still awaiting payment.
    ///
    /// An order placed by someone else is reported as not found.
    ///
    /// # Errors
    ///
    /// Returns `OrderTransitionError::Transition` unless the order is
    /// pending.
    pub async fn cancel_pending(
        &self,
        order_number: &str,
        customer_id: UserId,
    ) -> Result<Order, OrderTransitionError> {
        let mut tx = self.pool.begin().await?;

        let order = Self::lock_by_number(&mut tx, order_number)
            .await?
            .filter(|o| o.customer_id == customer_id)
            .ok_or(RepositoryError::NotFound)?;

        if order.status != OrderStatus::Pending {
            return Err(TransitionError {
                from: order.status,
                to: OrderStatus::Cancelled,
            }
            .into());
        }

        let extras = TransitionExtras {
            cancel_reason: Some("cancelled by customer".to_string()),
            ..TransitionExtras::default()
        };
        let updated =
            Self::apply_transition(&mut tx, &order, OrderStatus::Cancelled, &extras).await?;
        tx.commit().await?;
        Ok(updated)
    }
}

async fn item_quantities(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
) -> Result<Vec<(VariantId, i32)>, sqlx::Error> {
    // Variant order is fixed so concurrent payments lock rows in the same order.
    sqlx::query_as::<_, (VariantId, i32)>(
        r"
        SELECT variant_id, SUM(quantity)::INTEGER
        FROM shop.order_item WHERE order_id = $1
        GROUP BY variant_id ORDER BY variant_id
        ",
    )
    .bind(order_id)
    .fetch_all(&mut **tx)
    .await
}

async fn deduct_stock(
    tx: &mut Transaction<'_, Postgres>,
    order: &Order,
) -> Result<(), sqlx::Error> {
    for (variant_id, quantity) in item_quantities(tx, order.id).await? {
        let deducted = sqlx::query(
            r"
            UPDATE shop.product_variant
            SET stock = stock - $2, updated_at = NOW()
            WHERE id = $1 AND stock >= $2
            ",
        )
        .bind(variant_id)
        .bind(quantity)
        .execute(&mut **tx)
        .await?
        .rows_affected();

        if deducted == 0 {
            let previous: Option<i32> = sqlx::query_scalar(
                r"
                UPDATE shop.product_variant v SET stock = 0, updated_at = NOW()
                FROM (SELECT id, stock FROM shop.product_variant WHERE id = $1 FOR UPDATE) old
                WHERE v.id = old.id
                RETURNING old.stock
                ",
            )
            .bind(variant_id)
            .fetch_optional(&mut **tx)
            .await?;

            warn!(
                order_number = %order.order_number,
                variant_id = %variant_id,
                ordered = quantity,
                available = ?previous,
                "Stock shortfall on paid order, clamped to zero"
            );
        }
    }
    Ok(())
}

async fn restore_stock(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
) -> Result<(), sqlx::Error> {
    for (variant_id, quantity) in item_quantities(tx, order_id).await? {
        sqlx::query(
            "UPDATE shop.product_variant SET stock = stock + $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(variant_id)
        .bind(quantity)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Take one use of the voucher's quota for a paid order.
///
/// An exhausted quota is logged and the order keeps its discount, but
/// `voucher_consumed` stays false so a later cancellation releases nothing.
async fn consume_voucher(
    tx: &mut Transaction<'_, Postgres>,
    order: &Order,
    voucher_id: VoucherId,
) -> Result<(), sqlx::Error> {
    let consumed = sqlx::query(
        r"
        UPDATE shop.voucher SET used_count = used_count + 1, updated_at = NOW()
        WHERE id = $1 AND (quota IS NULL OR used_count < quota)
        ",
    )
    .bind(voucher_id)
    .execute(&mut **tx)
    .await?
    .rows_affected();

    if consumed == 0 {
        warn!(
            order_number = %order.order_number,
            voucher_id = %voucher_id,
            "Voucher quota already exhausted at payment"
        );
        return Ok(());
    }

    sqlx::query("UPDATE shop.customer_order SET voucher_consumed = TRUE WHERE id = $1")
        .bind(order.id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Give back the use taken by [`consume_voucher`], if there was one.
async fn release_voucher(
    tx: &mut Transaction<'_, Postgres>,
    order: &Order,
) -> Result<(), sqlx::Error> {
    let released = sqlx::query_scalar::<_, VoucherId>(
        r"
        UPDATE shop.customer_order SET voucher_consumed = FALSE
        WHERE id = $1 AND voucher_consumed AND voucher_id IS NOT NULL
        RETURNING voucher_id
        ",
    )
    .bind(order.id)
    .fetch_optional(&mut **tx)
    .await?;

    let Some(voucher_id) = released else {
        info!(
            order_number = %order.order_number,
            "Voucher use was never consumed, nothing to release"
        );
        return Ok(());
    };

    sqlx::query(
        r"
        UPDATE shop.voucher SET used_count = GREATEST(used_count - 1, 0), updated_at = NOW()
        WHERE id = $1
        ",
    )
    .bind(voucher_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
