//! Payment notification processing.
//!
//! Each notification is verified, then applied inside one transaction that
//! holds the order row lock. Replayed or out-of-order notifications only
//! update the transaction record: the state machine refuses the move.

use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument, warn};

use roastline_core::{
    GatewayStatus, Notification, OrderStatus, PaymentOutcome, SignatureError, UnknownStatus,
};

use crate::config::PaymentConfig;
use crate::db::{
    OrderRepository, OrderTransitionError, RepositoryError, TransactionRepository,
    TransitionExtras,
};

/// Errors from notification processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("malformed notification: {0}")]
    Malformed(String),

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error(transparent)]
    UnknownStatus(#[from] UnknownStatus),

    #[error("unknown order {0}")]
    OrderNotFound(String),

    #[error("gross amount {received} does not match order total {expected}")]
    AmountMismatch { expected: Decimal, received: String },

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for WebhookError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

/// What a notification did to its order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "result")]
pub enum WebhookEffect {
    /// The order moved to a new status.
    Transitioned { from: OrderStatus, to: OrderStatus },
    /// Only the transaction record changed.
    Recorded { status: OrderStatus },
}

impl WebhookEffect {
    /// Whether the notification's status should replace the stored one.
    ///
    /// True when the order moved, or when it is still awaiting payment and
    /// the gateway reports progress such as a fraud review.
    #[must_use]
    pub const fn updates_transaction_status(self) -> bool {
        match self {
            Self::Transitioned { .. } => true,
            Self::Recorded { status } => matches!(status, OrderStatus::Pending),
        }
    }
}

/// Verify and apply one gateway notification.
///
/// # Errors
///
/// Returns `WebhookError` for malformed, forged or unmatched notifications.
/// A refused transition is not an error.
#[instrument(skip_all)]
pub async fn process_notification(
    pool: &PgPool,
    payment: &PaymentConfig,
    raw: &serde_json::Value,
) -> Result<WebhookEffect, WebhookError> {
    let notification: Notification = serde_json::from_value(raw.clone())
        .map_err(|e| WebhookError::Malformed(e.to_string()))?;

    if let Err(e) = notification.verify_signature(payment.server_key.expose_secret()) {
        warn!(
            order_number = %notification.order_id,
            "Payment notification signature mismatch"
        );
        return Err(e.into());
    }

    let gateway_status = notification.gateway_status()?;
    let outcome = PaymentOutcome::classify(gateway_status, notification.fraud());

    let mut tx = pool.begin().await?;

    let order = OrderRepository::lock_by_number(&mut tx, &notification.order_id)
        .await?
        .ok_or_else(|| WebhookError::OrderNotFound(notification.order_id.clone()))?;

    let received = parse_amount(&notification.gross_amount)?;
    if received != order.total {
        warn!(
            order_number = %order.order_number,
            expected = %order.total,
            received = %notification.gross_amount,
            "Payment notification amount mismatch"
        );
        return Err(WebhookError::AmountMismatch {
            expected: order.total,
            received: notification.gross_amount.clone(),
        });
    }

    let effect = match target_for(outcome, gateway_status, order.status) {
        Some(next) if order.status.can_transition_to(next) => {
            let extras = TransitionExtras {
                cancel_reason: (next == OrderStatus::Cancelled)
                    .then(|| format!("payment {}", notification.transaction_status)),
                ..TransitionExtras::default()
            };
            OrderRepository::apply_transition(&mut tx, &order, next, &extras)
                .await
                .map_err(|e| match e {
                    OrderTransitionError::Repository(e) => WebhookError::Repository(e),
                    // Ruled out by `can_transition_to` above.
                    OrderTransitionError::Transition(t) => WebhookError::Repository(
                        RepositoryError::DataCorruption(t.to_string()),
                    ),
                })?;
            WebhookEffect::Transitioned {
                from: order.status,
                to: next,
            }
        }
        target => {
            info!(
                order_number = %order.order_number,
                status = %order.status,
                transaction_status = %notification.transaction_status,
                ?target,
                ?outcome,
                "Payment notification recorded without status change"
            );
            WebhookEffect::Recorded {
                status: order.status,
            }
        }
    };

    TransactionRepository::record_notification_in(
        &mut tx,
        order.id,
        order.total,
        &notification,
        raw,
        effect.updates_transaction_status(),
    )
    .await?;

    tx.commit().await?;
    Ok(effect)
}

/// Status the order should move to, if any.
///
/// A failed payment only cancels an order still awaiting payment, so a late
/// `deny` or `expire` cannot undo a settlement. Refunds and a gateway
/// `cancel` (a void of captured money) cancel orders whose stock is still
/// committed and not yet shipped. Everything else is recorded only.
fn target_for(
    outcome: PaymentOutcome,
    gateway_status: GatewayStatus,
    current: OrderStatus,
) -> Option<OrderStatus> {
    let committed = matches!(current, OrderStatus::Paid | OrderStatus::Processing);
    match outcome {
        PaymentOutcome::Refunded if !committed => None,
        PaymentOutcome::Failed
            if current != OrderStatus::Pending
                && !(gateway_status == GatewayStatus::Cancel && committed) =>
        {
            None
        }
        other => other.target_status(),
    }
}

fn parse_amount(value: &str) -> Result<Decimal, WebhookError> {
    value
        .trim()
        .parse::<Decimal>()
        .map_err(|_| WebhookError::Malformed(format!("invalid gross_amount {value:?}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use roastline_core::FraudStatus;

    use super::*;

    #[test]
    fn test_parse_amount_ignores_scale() {
        assert_eq!(parse_amount("150000.00").unwrap(), Decimal::from(150_000));
        assert!(matches!(
            parse_amount("abc"),
            Err(WebhookError::Malformed(_))
        ));
    }

    fn target(status: GatewayStatus, current: OrderStatus) -> Option<OrderStatus> {
        target_for(PaymentOutcome::classify(status, None), status, current)
    }

    #[test]
    fn test_target_for_pending_order() {
        assert_eq!(
            target(GatewayStatus::Settlement, OrderStatus::Pending),
            Some(OrderStatus::Paid)
        );
        assert_eq!(
            target(GatewayStatus::Expire, OrderStatus::Pending),
            Some(OrderStatus::Cancelled)
        );
        assert_eq!(
            target(GatewayStatus::Cancel, OrderStatus::Pending),
            Some(OrderStatus::Cancelled)
        );
        assert_eq!(target(GatewayStatus::Pending, OrderStatus::Pending), None);
        assert_eq!(
            target_for(
                PaymentOutcome::AwaitingReview,
                GatewayStatus::Capture,
                OrderStatus::Pending
            ),
            None
        );
    }

    #[test]
    fn test_late_failure_does_not_cancel_paid_order() {
        for status in [
            GatewayStatus::Deny,
            GatewayStatus::Expire,
            GatewayStatus::Failure,
        ] {
            assert_eq!(target(status, OrderStatus::Paid), None, "{status:?}");
            assert_eq!(target(status, OrderStatus::Processing), None, "{status:?}");
        }
        assert_eq!(
            target_for(
                PaymentOutcome::classify(GatewayStatus::Capture, Some(FraudStatus::Deny)),
                GatewayStatus::Capture,
                OrderStatus::Paid
            ),
            None
        );
    }

    #[test]
    fn test_void_cancels_committed_orders_only() {
        assert_eq!(
            target(GatewayStatus::Cancel, OrderStatus::Paid),
            Some(OrderStatus::Cancelled)
        );
        assert_eq!(
            target(GatewayStatus::Cancel, OrderStatus::Processing),
            Some(OrderStatus::Cancelled)
        );
        assert_eq!(target(GatewayStatus::Cancel, OrderStatus::Shipped), None);
    }

    #[test]
    fn test_refund_only_cancels_committed_orders() {
        assert_eq!(
            target(GatewayStatus::Refund, OrderStatus::Paid),
            Some(OrderStatus::Cancelled)
        );
        assert_eq!(
            target(GatewayStatus::PartialRefund, OrderStatus::Processing),
            Some(OrderStatus::Cancelled)
        );
        assert_eq!(target(GatewayStatus::Refund, OrderStatus::Pending), None);
        assert_eq!(target(GatewayStatus::Refund, OrderStatus::Shipped), None);
    }

    #[test]
    fn test_stale_notification_keeps_transaction_status() {
        assert!(
            WebhookEffect::Transitioned {
                from: OrderStatus::Pending,
                to: OrderStatus::Paid,
            }
            .updates_transaction_status()
        );
        assert!(
            WebhookEffect::Recorded {
                status: OrderStatus::Pending
            }
            .updates_transaction_status()
        );
        assert!(
            !WebhookEffect::Recorded {
                status: OrderStatus::Paid
            }
            .updates_transaction_status()
        );
        assert!(
            !WebhookEffect::Recorded {
                status: OrderStatus::Cancelled
            }
            .updates_transaction_status()
        );
    }

    #[test]
    fn test_effect_serializes() {
        let json = serde_json::to_value(WebhookEffect::Transitioned {
            from: OrderStatus::Pending,
            to: OrderStatus::Paid,
        })
        .unwrap();
        assert_eq!(json["result"], "transitioned");
        assert_eq!(json["to"], "paid");
    }
}
