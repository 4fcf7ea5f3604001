//! Order status state machine.
//!
//! Both the payment webhook and the back-office fulfilment endpoints move
//! orders through [`OrderStatus::transition`]. Because the machine refuses
//! self-transitions and backwards moves, a replayed gateway notification or
//! a double-clicked "cancel" is rejected here instead of touching stock twice.
//!
//! ```text
//! Pending ──► Paid ──► Processing ──► Shipped ──► Delivered
//!    │         │  └─────────────────────►▲
//!    │         │             │
//!    └─────────┴─────────────┴──► Cancelled
//! ```

use crate::types::OrderStatus;

/// Inventory side effect of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockEffect {
    /// Take the ordered quantities out of stock.
    Deduct,
    /// Put previously deducted quantities back.
    Restore,
    None,
}

/// A transition the state machine does not allow.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot move order from {from} to {to}")]
pub struct TransitionError {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

impl OrderStatus {
    /// Whether `self → next` is an allowed move.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        use OrderStatus::{Cancelled, Delivered, Paid, Pending, Processing, Shipped};

        matches!(
            (self, next),
            (Pending, Paid | Cancelled)
                | (Paid, Processing | Shipped | Cancelled)
                | (Processing, Shipped | Cancelled)
                | (Shipped, Delivered)
        )
    }

    /// Validate `self → next` and report what must happen to stock.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] if the move is not allowed, including
    /// `next == self`.
    pub const fn transition(self, next: Self) -> Result<StockEffect, TransitionError> {
        if !self.can_transition_to(next) {
            return Err(TransitionError {
                from: self,
                to: next,
            });
        }

        Ok(match (self, next) {
            (_, Self::Paid) => StockEffect::Deduct,
            (Self::Paid | Self::Processing, Self::Cancelled) => StockEffect::Restore,
            _ => StockEffect::None,
        })
    }

    /// No further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Stock for this order's items has been deducted and not restored.
    #[must_use]
    pub const fn is_stock_committed(self) -> bool {
        matches!(
            self,
            Self::Paid | Self::Processing | Self::Shipped | Self::Delivered
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::OrderStatus::{Cancelled, Delivered, Paid, Pending, Processing, Shipped};

    #[test]
    fn test_payment_deducts_stock() {
        assert_eq!(Pending.transition(Paid), Ok(StockEffect::Deduct));
    }

    #[test]
    fn test_cancel_effects() {
        assert_eq!(Pending.transition(Cancelled), Ok(StockEffect::None));
        assert_eq!(Paid.transition(Cancelled), Ok(StockEffect::Restore));
        assert_eq!(Processing.transition(Cancelled), Ok(StockEffect::Restore));
        assert!(Shipped.transition(Cancelled).is_err());
    }

    #[test]
    fn test_fulfilment_path() {
        assert_eq!(Paid.transition(Processing), Ok(StockEffect::None));
        assert_eq!(Processing.transition(Shipped), Ok(StockEffect::None));
        assert_eq!(Paid.transition(Shipped), Ok(StockEffect::None));
        assert_eq!(Shipped.transition(Delivered), Ok(StockEffect::None));
    }

    #[test]
    fn test_self_transitions_rejected() {
        for status in OrderStatus::ALL {
            assert_eq!(
                status.transition(status),
                Err(TransitionError {
                    from: status,
                    to: status
                })
            );
        }
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for from in OrderStatus::ALL.into_iter().filter(|s| s.is_terminal()) {
            for to in OrderStatus::ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_backwards_rejected() {
        assert!(Paid.transition(Pending).is_err());
        assert!(Delivered.transition(Shipped).is_err());
        let err = Shipped.transition(Processing).unwrap_err();
        assert_eq!(err.to_string(), "cannot move order from shipped to processing");
    }

    #[test]
    fn test_stock_committed() {
        assert!(!Pending.is_stock_committed());
        assert!(!Cancelled.is_stock_committed());
        assert!(Paid.is_stock_committed());
        assert!(Delivered.is_stock_committed());
    }
}
