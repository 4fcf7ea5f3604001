//! Order views for fulfilment staff.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use roastline_core::{CustomerTier, OrderStatus};
use roastline_storefront::models::{Order, OrderItem, PaymentTransaction, User};

/// Row of `GET /orders`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderListRow {
    pub order_number: String,
    pub status: OrderStatus,
    pub tier: CustomerTier,
    pub total: Decimal,
    pub customer_name: String,
    pub customer_email: String,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Body of `GET /orders/{number}`.
#[derive(Debug, Clone, Serialize)]
pub struct AdminOrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payment: Option<PaymentTransaction>,
    pub customer: User,
}

/// Body of `POST /orders/{number}/ship`.
#[derive(Debug, Clone, Deserialize)]
pub struct ShipRequest {
    /// A blank value is rejected with 400 by the fulfilment service.
    #[serde(default)]
    pub tracking_number: String,
}

/// Body of `POST /orders/{number}/cancel`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub reason: Option<String>,
}
