//! Dashboard figures.

use rust_decimal::Decimal;
use serde::Serialize;

use roastline_core::{OrderStatus, VariantId};

/// Number of orders in one status.
#[derive(Debug, Clone, Copy, Serialize, sqlx::FromRow)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

/// An active variant running out.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LowStockVariant {
    pub variant_id: VariantId,
    pub product_name: String,
    pub variant_name: String,
    pub sku: String,
    pub stock: i32,
}

/// Body of `GET /dashboard`.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    /// Every status appears, with zero when no order has it.
    pub orders_by_status: Vec<StatusCount>,
    pub revenue_today: Decimal,
    pub revenue_last_30_days: Decimal,
    pub pending_b2b_requests: i64,
    pub low_stock: Vec<LowStockVariant>,
}

/// Fill in statuses with no orders so the dashboard shows a fixed set of rows.
#[must_use]
pub fn complete_status_counts(counts: &[StatusCount]) -> Vec<StatusCount> {
    OrderStatus::ALL
        .iter()
        .map(|&status| StatusCount {
            status,
            count: counts
                .iter()
                .find(|c| c.status == status)
                .map_or(0, |c| c.count),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_status_counts() {
        let counts = complete_status_counts(&[
            StatusCount {
                status: OrderStatus::Paid,
                count: 4,
            },
            StatusCount {
                status: OrderStatus::Shipped,
                count: 1,
            },
        ]);

        assert_eq!(counts.len(), OrderStatus::ALL.len());
        let paid = counts.iter().find(|c| c.status == OrderStatus::Paid);
        assert_eq!(paid.map(|c| c.count), Some(4));
        let pending = counts.iter().find(|c| c.status == OrderStatus::Pending);
        assert_eq!(pending.map(|c| c.count), Some(0));
    }
}
