//! Staff-driven order status changes.
//!
//! Each call locks the order, asks the state machine, applies stock and
//! voucher effects and commits, all through the storefront's
//! `OrderRepository::transition`.

use sqlx::PgPool;
use tracing::{info, instrument};

use roastline_core::{AdminUserId, OrderStatus};
use roastline_storefront::db::{OrderRepository, OrderTransitionError, TransitionExtras};

use crate::models::Order;

/// Error for a blank tracking number.
#[derive(Debug, thiserror::Error)]
#[error("tracking_number is required")]
pub struct MissingTrackingNumber;

/// Errors from fulfilment actions.
#[derive(Debug, thiserror::Error)]
pub enum FulfilmentError {
    #[error(transparent)]
    MissingTracking(#[from] MissingTrackingNumber),

    #[error(transparent)]
    Transition(#[from] OrderTransitionError),
}

pub struct FulfilmentService<'a> {
    orders: OrderRepository<'a>,
    admin_id: AdminUserId,
}

impl<'a> FulfilmentService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, admin_id: AdminUserId) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            admin_id,
        }
    }

    /// Paid → Processing.
    ///
    /// # Errors
    ///
    /// Returns `FulfilmentError::Transition` for an unknown order or a
    /// refused move.
    #[instrument(skip(self), fields(admin_id = %self.admin_id))]
    pub async fn process(&self, order_number: &str) -> Result<Order, FulfilmentError> {
        self.apply(order_number, OrderStatus::Processing, TransitionExtras::default())
            .await
    }

    /// Paid/Processing → Shipped with a courier tracking number.
    ///
    /// # Errors
    ///
    /// Returns `FulfilmentError::MissingTracking` for a blank tracking
    /// number, otherwise as [`Self::process`].
    #[instrument(skip(self), fields(admin_id = %self.admin_id))]
    pub async fn ship(
        &self,
        order_number: &str,
        tracking_number: &str,
    ) -> Result<Order, FulfilmentError> {
        let tracking_number = normalize_tracking(tracking_number)?;
        let extras = TransitionExtras {
            tracking_number: Some(tracking_number),
            ..TransitionExtras::default()
        };
        self.apply(order_number, OrderStatus::Shipped, extras).await
    }

    /// Shipped → Delivered.
    ///
    /// # Errors
    ///
    /// As [`Self::process`].
    #[instrument(skip(self), fields(admin_id = %self.admin_id))]
    pub async fn deliver(&self, order_number: &str) -> Result<Order, FulfilmentError> {
        self.apply(order_number, OrderStatus::Delivered, TransitionExtras::default())
            .await
    }

    /// Pending/Paid/Processing → Cancelled. Committed stock goes back on the
    /// shelf and voucher usage is released.
    ///
    /// # Errors
    ///
    /// As [`Self::process`].
    #[instrument(skip(self), fields(admin_id = %self.admin_id))]
    pub async fn cancel(
        &self,
        order_number: &str,
        reason: Option<&str>,
    ) -> Result<Order, FulfilmentError> {
        let extras = TransitionExtras {
            cancel_reason: Some(cancel_reason(reason)),
            ..TransitionExtras::default()
        };
        self.apply(order_number, OrderStatus::Cancelled, extras).await
    }

    async fn apply(
        &self,
        order_number: &str,
        next: OrderStatus,
        extras: TransitionExtras,
    ) -> Result<Order, FulfilmentError> {
        let order = self.orders.transition(order_number, next, &extras).await?;
        info!(
            order_number = %order.order_number,
            status = %order.status,
            admin_id = %self.admin_id,
            "Order updated by staff"
        );
        Ok(order)
    }
}

fn normalize_tracking(tracking_number: &str) -> Result<String, MissingTrackingNumber> {
    let tracking_number = tracking_number.trim();
    if tracking_number.is_empty() {
        return Err(MissingTrackingNumber);
    }
    Ok(tracking_number.to_string())
}

fn cancel_reason(reason: Option<&str>) -> String {
    reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or("cancelled by staff")
        .to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_number_required() {
        assert!(normalize_tracking("   ").is_err());
        assert_eq!(normalize_tracking(" JNE123 ").unwrap(), "JNE123");
    }

    #[test]
    fn test_cancel_reason_default() {
        assert_eq!(cancel_reason(None), "cancelled by staff");
        assert_eq!(cancel_reason(Some("  ")), "cancelled by staff");
        assert_eq!(cancel_reason(Some("out of beans")), "out of beans");
    }
}
