//! Hosted-payment (Snap) client for the payment gateway.
//!
//! Checkout asks the gateway for a token and redirect URL. The outcome of
//! the payment arrives later as a webhook notification.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, instrument};

use roastline_core::is_whole_units;

use crate::config::PaymentConfig;
use crate::models::{Order, OrderItem};

/// Gateway limit on item names.
const MAX_ITEM_NAME: usize = 50;

/// Errors from the payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response did not have the expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// Amount cannot be expressed in whole currency units.
    #[error("invalid amount: {0}")]
    InvalidAmount(Decimal),
}

/// Token and redirect URL for the hosted payment page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapToken {
    pub token: String,
    pub redirect_url: String,
}

/// Body of a Snap transaction request.
#[derive(Debug, Clone, Serialize)]
pub struct SnapRequest {
    pub transaction_details: TransactionDetails,
    pub item_details: Vec<ItemDetail>,
    pub customer_details: CustomerDetails,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionDetails {
    pub order_id: String,
    pub gross_amount: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemDetail {
    pub id: String,
    pub price: i64,
    pub quantity: i32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerDetails {
    pub first_name: String,
    pub email: String,
    pub phone: String,
}

impl SnapRequest {
    /// Build the request for an order.
    ///
    /// Shipping and the voucher discount are sent as extra lines so the item
    /// prices add up to the gross amount.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidAmount` if an amount does not fit.
    pub fn for_order(order: &Order, items: &[OrderItem], email: &str) -> Result<Self, PaymentError> {
        let mut item_details = items
            .iter()
            .map(|item| {
                Ok(ItemDetail {
                    id: item.sku.clone(),
                    price: whole_units(item.unit_price)?,
                    quantity: item.quantity,
                    name: item_name(&item.product_name, &item.variant_name),
                })
            })
            .collect::<Result<Vec<_>, PaymentError>>()?;

        if order.shipping_cost > Decimal::ZERO {
            item_details.push(ItemDetail {
                id: "SHIPPING".to_string(),
                price: whole_units(order.shipping_cost)?,
                quantity: 1,
                name: item_name("Shipping", &order.courier_service.to_uppercase()),
            });
        }

        if order.voucher_discount > Decimal::ZERO {
            item_details.push(ItemDetail {
                id: "VOUCHER".to_string(),
                price: -whole_units(order.voucher_discount)?,
                quantity: 1,
                name: item_name("Voucher", order.voucher_code.as_deref().unwrap_or_default()),
            });
        }

        Ok(Self {
            transaction_details: TransactionDetails {
                order_id: order.order_number.clone(),
                gross_amount: whole_units(order.total)?,
            },
            item_details,
            customer_details: CustomerDetails {
                first_name: order.recipient_name.clone(),
                email: email.to_string(),
                phone: order.phone.clone(),
            },
        })
    }
}

/// The gateway echoes `gross_amount` back in notifications and it is compared
/// against the stored total, so a fractional amount is refused instead of
/// rounded.
fn whole_units(amount: Decimal) -> Result<i64, PaymentError> {
    if !is_whole_units(amount) {
        return Err(PaymentError::InvalidAmount(amount));
    }
    amount.to_i64().ok_or(PaymentError::InvalidAmount(amount))
}

fn item_name(product: &str, variant: &str) -> String {
    let name = if variant.is_empty() {
        product.to_string()
    } else {
        format!("{product} - {variant}")
    };
    name.chars().take(MAX_ITEM_NAME).collect()
}

/// Client for the gateway's Snap API.
#[derive(Clone)]
pub struct PaymentGateway {
    inner: Arc<PaymentGatewayInner>,
}

struct PaymentGatewayInner {
    client: reqwest::Client,
    endpoint: String,
    authorization: String,
}

impl PaymentGateway {
    /// Create a new gateway client.
    #[must_use]
    pub fn new(config: &PaymentConfig) -> Self {
        // Basic auth with the server key as username and an empty password.
        let credentials = STANDARD.encode(format!("{}:", config.server_key.expose_secret()));

        Self {
            inner: Arc::new(PaymentGatewayInner {
                client: reqwest::Client::new(),
                endpoint: format!("{}/snap/v1/transactions", config.snap_base_url()),
                authorization: format!("Basic {credentials}"),
            }),
        }
    }

    /// Request a hosted-payment token.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError` if the gateway is unreachable or refuses the
    /// request.
    #[instrument(skip(self, request), fields(order_id = %request.transaction_details.order_id))]
    pub async fn create_transaction(&self, request: &SnapRequest) -> Result<SnapToken, PaymentError> {
        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header("Authorization", &self.inner.authorization)
            .header("Accept", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Payment gateway returned non-success status"
            );
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|e| PaymentError::Parse(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use roastline_core::{
        CustomerTier, OrderId, OrderItemId, OrderStatus, ProductId, UserId, VariantId,
    };

    use super::*;

    fn order() -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::new(1),
            order_number: "RL-20240601-ABC123".to_string(),
            customer_id: UserId::new(7),
            status: OrderStatus::Pending,
            tier: CustomerTier::B2c,
            subtotal: Decimal::from(150_000),
            tier_discount: Decimal::ZERO,
            voucher_discount: Decimal::from(15_000),
            shipping_cost: Decimal::from(20_000),
            total: Decimal::from(155_000),
            voucher_id: None,
            voucher_code: Some("HEMAT10".to_string()),
            courier: "jne".to_string(),
            courier_service: "reg".to_string(),
            tracking_number: None,
            recipient_name: "Sari".to_string(),
            phone: "0812".to_string(),
            street: "Jl. Braga 1".to_string(),
            city: "Bandung".to_string(),
            province: "Jawa Barat".to_string(),
            postal_code: "40111".to_string(),
            notes: None,
            cancel_reason: None,
            paid_at: None,
            shipped_at: None,
            delivered_at: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn item() -> OrderItem {
        OrderItem {
            id: OrderItemId::new(1),
            order_id: OrderId::new(1),
            product_id: ProductId::new(3),
            variant_id: VariantId::new(4),
            product_name: "Gayo Wine Process".to_string(),
            variant_name: "250g Whole Bean".to_string(),
            sku: "GAYO-250".to_string(),
            unit_price: Decimal::from(75_000),
            quantity: 2,
            line_total: Decimal::from(150_000),
        }
    }

    #[test]
    fn test_snap_request_items_sum_to_gross_amount() {
        let request = SnapRequest::for_order(&order(), &[item()], "sari@example.com").unwrap();

        let sum: i64 = request
            .item_details
            .iter()
            .map(|i| i.price * i64::from(i.quantity))
            .sum();
        assert_eq!(sum, request.transaction_details.gross_amount);
        assert_eq!(request.transaction_details.gross_amount, 155_000);
        assert_eq!(request.transaction_details.order_id, "RL-20240601-ABC123");
    }

    #[test]
    fn test_snap_request_serializes_gateway_shape() {
        let request = SnapRequest::for_order(&order(), &[item()], "sari@example.com").unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["transaction_details"]["gross_amount"], 155_000);
        assert_eq!(json["item_details"][0]["id"], "GAYO-250");
        assert_eq!(json["customer_details"]["email"], "sari@example.com");
    }

    #[test]
    fn test_fractional_total_is_refused() {
        let order = Order {
            subtotal: Decimal::new(9_999_950, 2),
            voucher_discount: Decimal::ZERO,
            shipping_cost: Decimal::from(18_000),
            total: Decimal::new(11_799_950, 2),
            voucher_code: None,
            ..order()
        };
        let item = OrderItem {
            unit_price: Decimal::new(9_999_950, 2),
            quantity: 1,
            line_total: Decimal::new(9_999_950, 2),
            ..item()
        };

        assert!(matches!(
            SnapRequest::for_order(&order, &[item], "sari@example.com"),
            Err(PaymentError::InvalidAmount(_))
        ));
        assert_eq!(whole_units(Decimal::new(11_800_000, 2)).unwrap(), 118_000);
    }

    #[test]
    fn test_item_name_truncated() {
        let name = item_name(&"x".repeat(80), "250g");
        assert_eq!(name.chars().count(), MAX_ITEM_NAME);
    }

    #[test]
    fn test_snap_token_parses() {
        let token: SnapToken = serde_json::from_str(
            r#"{"token":"66e4fa55","redirect_url":"https://app.sandbox.midtrans.com/snap/v2/vtweb/66e4fa55"}"#,
        )
        .unwrap();
        assert_eq!(token.token, "66e4fa55");
    }
}
