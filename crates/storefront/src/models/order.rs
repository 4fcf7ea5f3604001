//! Orders, their items, and payment transactions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use roastline_core::{
    CustomerTier, OrderId, OrderItemId, OrderStatus, ProductId, TransactionId, UserId, VariantId,
    VoucherId,
};

/// An order with its price and shipping-address snapshots.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub customer_id: UserId,
    pub status: OrderStatus,
    pub tier: CustomerTier,
    pub subtotal: Decimal,
    pub tier_discount: Decimal,
    pub voucher_discount: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
    pub voucher_id: Option<VoucherId>,
    pub voucher_code: Option<String>,
    pub courier: String,
    pub courier_service: String,
    pub tracking_number: Option<String>,
    pub recipient_name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub notes: Option<String>,
    pub cancel_reason: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A purchased line, frozen at checkout.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub product_name: String,
    pub variant_name: String,
    pub sku: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

/// Gateway state of an order's payment.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PaymentTransaction {
    pub id: TransactionId,
    pub order_id: OrderId,
    pub gross_amount: Decimal,
    /// Last gateway `transaction_status`.
    pub status: String,
    pub fraud_status: Option<String>,
    pub gateway_transaction_id: Option<String>,
    pub payment_type: Option<String>,
    pub snap_token: Option<String>,
    pub redirect_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row for order history listings.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderSummary {
    pub order_number: String,
    pub status: OrderStatus,
    pub total: Decimal,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}

/// An order with everything a detail page needs.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payment: Option<PaymentTransaction>,
}
