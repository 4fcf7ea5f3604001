//! Payment transaction repository.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use roastline_core::{Notification, OrderId};

use super::RepositoryError;
use crate::models::PaymentTransaction;

const TRANSACTION_COLUMNS: &str = "id, order_id, gross_amount, status, fraud_status, \
     gateway_transaction_id, payment_type, snap_token, redirect_url, created_at, updated_at";

pub struct TransactionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TransactionRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Open a `pending` transaction for a new order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_pending_in(
        tx: &mut Transaction<'_, Postgres>,
        order_id: OrderId,
        gross_amount: Decimal,
    ) -> Result<PaymentTransaction, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentTransaction>(&format!(
            r"
            INSERT INTO shop.payment_transaction (order_id, gross_amount)
            VALUES ($1, $2)
            RETURNING {TRANSACTION_COLUMNS}
            "
        ))
        .bind(order_id)
        .bind(gross_amount)
        .fetch_one(&mut **tx)
        .await?;
        Ok(row)
    }

    /// Store the hosted-payment token issued by the gateway.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order has no transaction.
    pub async fn set_token(
        &self,
        order_id: OrderId,
        token: &str,
        redirect_url: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.payment_transaction
            SET snap_token = $2, redirect_url = $3, updated_at = NOW()
            WHERE order_id = $1
            ",
        )
        .bind(order_id)
        .bind(token)
        .bind(redirect_url)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Record a verified gateway notification against the order's transaction.
    ///
    /// The raw payload is always stored. With `update_status` false the
    /// previous status and fraud verdict are kept, so a stale notification
    /// cannot make a paid order look unpaid.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn record_notification_in(
        tx: &mut Transaction<'_, Postgres>,
        order_id: OrderId,
        gross_amount: Decimal,
        notification: &Notification,
        raw: &serde_json::Value,
        update_status: bool,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO shop.payment_transaction
                (order_id, gross_amount, status, fraud_status, gateway_transaction_id,
                 payment_type, raw_notification)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (order_id) DO UPDATE
            SET status = CASE WHEN $8 THEN EXCLUDED.status
                              ELSE shop.payment_transaction.status END,
                fraud_status = CASE WHEN $8 THEN EXCLUDED.fraud_status
                                    ELSE shop.payment_transaction.fraud_status END,
                gateway_transaction_id = COALESCE(EXCLUDED.gateway_transaction_id,
                                                  shop.payment_transaction.gateway_transaction_id),
                payment_type = COALESCE(EXCLUDED.payment_type, shop.payment_transaction.payment_type),
                raw_notification = EXCLUDED.raw_notification,
                updated_at = NOW()
            ",
        )
        .bind(order_id)
        .bind(gross_amount)
        .bind(&notification.transaction_status)
        .bind(notification.fraud_status.as_deref())
        .bind(notification.transaction_id.as_deref())
        .bind(notification.payment_type.as_deref())
        .bind(raw)
        .bind(update_status)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// The transaction of an order, if one was opened.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Option<PaymentTransaction>, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentTransaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM shop.payment_transaction WHERE order_id = $1"
        ))
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }
}
