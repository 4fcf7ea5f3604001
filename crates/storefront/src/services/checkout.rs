//! Checkout: turn a cart into a PENDING order and a payment token.
//!
//! Prices, stock, the shipping quote and the voucher are all re-checked
//! server-side. Only the address and the chosen courier service come from
//! the client.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument, warn};

use roastline_core::{
    AddressId, CustomerTier, OrderNumber, OrderTotals, PricingError, UserId, VoucherError,
    normalize_code,
};

use crate::db::{
    AddressRepository, CartRepository, NewOrder, NewOrderItem, OrderRepository, RepositoryError,
    TransactionRepository, UserRepository, VoucherRepository,
};
use crate::models::{Address, CartItemView, CartLine, CartView, Order, Voucher};
use crate::models::cart::total_weight_grams;
use crate::services::payment::{PaymentError, PaymentGateway, SnapRequest, SnapToken};
use crate::services::shipping::{ShippingClient, ShippingError, ShippingRate};
use crate::state::AppState;

/// Attempts at finding an unused order number.
const ORDER_NUMBER_ATTEMPTS: usize = 3;

/// Errors from checkout and voucher quoting.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("{sku} is no longer available")]
    Unavailable { sku: String },

    #[error("insufficient stock for {sku}: only {available} available")]
    InsufficientStock { sku: String, available: i32 },

    #[error("address not found")]
    AddressNotFound,

    #[error("voucher code is required")]
    MissingVoucherCode,

    #[error(transparent)]
    Voucher(#[from] VoucherError),

    #[error(transparent)]
    Shipping(#[from] ShippingError),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// The order was saved but the gateway did not issue a token.
    #[error("payment gateway unavailable for order {order_number}: {source}")]
    Payment {
        order_number: String,
        #[source]
        source: PaymentError,
    },

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Body of `POST /checkout` and `POST /checkout/preview`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub address_id: AddressId,
    pub courier: String,
    pub service: String,
    #[serde(default)]
    pub voucher_code: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Totals for a prospective order.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutPreview {
    pub items: Vec<CartItemView>,
    pub tier: CustomerTier,
    pub shipping: ShippingRate,
    pub voucher_code: Option<String>,
    #[serde(flatten)]
    pub totals: OrderTotals,
}

/// Response of a successful checkout.
#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
    pub order_number: String,
    pub total: Decimal,
    pub payment_token: String,
    pub redirect_url: String,
}

/// A voucher applied to the current cart.
#[derive(Debug, Clone, Serialize)]
pub struct VoucherQuote {
    pub code: String,
    pub description: String,
    pub discount: Decimal,
    pub subtotal: Decimal,
    pub new_subtotal: Decimal,
}

/// Everything validated before an order is written.
struct Prepared {
    tier: CustomerTier,
    lines: Vec<CartLine>,
    cart: CartView,
    address: Address,
    shipping: ShippingRate,
    voucher: Option<Voucher>,
    totals: OrderTotals,
}

pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    shipping: &'a ShippingClient,
    gateway: &'a PaymentGateway,
    b2b_discount_percent: Decimal,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            pool: state.pool(),
            shipping: state.shipping(),
            gateway: state.gateway(),
            b2b_discount_percent: state.config().b2b_discount_percent,
        }
    }

    /// Price the order without writing anything.
    ///
    /// # Errors
    ///
    /// Returns the same validation errors as [`Self::place_order`].
    #[instrument(skip(self, request))]
    pub async fn preview(
        &self,
        customer_id: UserId,
        request: &CheckoutRequest,
    ) -> Result<CheckoutPreview, CheckoutError> {
        let prepared = self.prepare(customer_id, request).await?;
        Ok(CheckoutPreview {
            items: prepared.cart.items,
            tier: prepared.tier,
            shipping: prepared.shipping,
            voucher_code: prepared.voucher.map(|v| v.code),
            totals: prepared.totals,
        })
    }

    /// Place a PENDING order and request a payment token for it.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Payment` if the order was saved but the
    /// gateway failed. The order can be paid later.
    #[instrument(skip(self, request, email))]
    pub async fn place_order(
        &self,
        customer_id: UserId,
        email: &str,
        request: &CheckoutRequest,
    ) -> Result<PlacedOrder, CheckoutError> {
        let prepared = self.prepare(customer_id, request).await?;
        let items = order_items(&prepared.lines, &prepared.cart);
        let notes = request
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        let mut attempt = 0;
        let order = loop {
            attempt += 1;
            match self
                .write_order(customer_id, request, &prepared, &items, notes)
                .await
            {
                Err(CheckoutError::Repository(RepositoryError::Conflict(_)))
                    if attempt < ORDER_NUMBER_ATTEMPTS =>
                {
                    warn!(attempt, "Order number collision, retrying");
                }
                other => break other?,
            }
        };

        info!(
            order_number = %order.order_number,
            total = %order.total,
            "Order placed"
        );

        let token = self.request_payment(&order, email).await?;

        Ok(PlacedOrder {
            order_number: order.order_number,
            total: order.total,
            payment_token: token.token,
            redirect_url: token.redirect_url,
        })
    }

    /// Ask the gateway for a payment token for a saved order and store it.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Payment` if the gateway fails.
    pub async fn request_payment(&self, order: &Order, email: &str) -> Result<SnapToken, CheckoutError> {
        let items = OrderRepository::new(self.pool).items(order.id).await?;
        let payment_error = |source: PaymentError| CheckoutError::Payment {
            order_number: order.order_number.clone(),
            source,
        };

        let request = SnapRequest::for_order(order, &items, email).map_err(payment_error)?;
        let token = self
            .gateway
            .create_transaction(&request)
            .await
            .map_err(payment_error)?;

        TransactionRepository::new(self.pool)
            .set_token(order.id, &token.token, &token.redirect_url)
            .await?;

        Ok(token)
    }

    /// Validate a voucher code against the current cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Voucher` with the reason the code is refused.
    pub async fn quote_voucher(
        &self,
        customer_id: UserId,
        code: &str,
    ) -> Result<VoucherQuote, CheckoutError> {
        let tier = UserRepository::new(self.pool).get_tier(customer_id).await?;
        let lines = CartRepository::new(self.pool).lines(customer_id).await?;
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let cart = CartView::price(&lines, tier, self.b2b_discount_percent)?;

        let (voucher, discount) = self.resolve_voucher(code, tier, cart.subtotal).await?;
        Ok(VoucherQuote {
            code: voucher.code,
            description: voucher.description,
            discount,
            subtotal: cart.subtotal,
            new_subtotal: cart.subtotal - discount,
        })
    }

    async fn resolve_voucher(
        &self,
        code: &str,
        tier: CustomerTier,
        subtotal: Decimal,
    ) -> Result<(Voucher, Decimal), CheckoutError> {
        let code = normalize_code(code);
        if code.is_empty() {
            return Err(CheckoutError::MissingVoucherCode);
        }

        let voucher = VoucherRepository::new(self.pool)
            .get_by_code(&code)
            .await?
            .ok_or(VoucherError::NotFound)?;

        let rules = voucher.rules();
        rules.validate(Utc::now(), tier, subtotal)?;
        let discount = rules.discount_for(subtotal);
        Ok((voucher, discount))
    }

    async fn prepare(
        &self,
        customer_id: UserId,
        request: &CheckoutRequest,
    ) -> Result<Prepared, CheckoutError> {
        let lines = CartRepository::new(self.pool).lines(customer_id).await?;
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        check_lines(&lines)?;

        let tier = UserRepository::new(self.pool).get_tier(customer_id).await?;
        let cart = CartView::price(&lines, tier, self.b2b_discount_percent)?;

        let address = AddressRepository::new(self.pool)
            .get(customer_id, request.address_id)
            .await?
            .ok_or(CheckoutError::AddressNotFound)?;

        let shipping = self
            .shipping
            .find_rate(
                &address.city_id,
                total_weight_grams(&lines),
                &request.courier,
                &request.service,
            )
            .await?;

        let (voucher, voucher_discount) = match request
            .voucher_code
            .as_deref()
            .filter(|c| !c.trim().is_empty())
        {
            Some(code) => {
                let (voucher, discount) = self.resolve_voucher(code, tier, cart.subtotal).await?;
                (Some(voucher), discount)
            }
            None => (None, Decimal::ZERO),
        };

        let totals = OrderTotals::compute(
            &cart.line_inputs(),
            cart.list_subtotal,
            voucher_discount,
            shipping.cost,
        )?;

        Ok(Prepared {
            tier,
            lines,
            cart,
            address,
            shipping,
            voucher,
            totals,
        })
    }

    async fn write_order(
        &self,
        customer_id: UserId,
        request: &CheckoutRequest,
        prepared: &Prepared,
        items: &[NewOrderItem],
        notes: Option<&str>,
    ) -> Result<Order, CheckoutError> {
        let order_number = OrderNumber::generate(Utc::now().date_naive());
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let order = OrderRepository::insert_in(
            &mut tx,
            &NewOrder {
                order_number: order_number.as_str(),
                customer_id,
                tier: prepared.tier,
                totals: &prepared.totals,
                voucher: prepared.voucher.as_ref().map(|v| (v.id, v.code.as_str())),
                courier: &prepared.shipping.courier,
                courier_service: &prepared.shipping.service,
                address: &prepared.address,
                notes,
            },
            items,
        )
        .await?;

        TransactionRepository::insert_pending_in(&mut tx, order.id, order.total).await?;
        CartRepository::clear_in(&mut tx, customer_id).await?;

        tx.commit().await.map_err(RepositoryError::from)?;
        info!(courier = %request.courier, service = %request.service, "Checkout committed");
        Ok(order)
    }
}

/// Every line must be active and within stock.
fn check_lines(lines: &[CartLine]) -> Result<(), CheckoutError> {
    for line in lines {
        if !line.available {
            return Err(CheckoutError::Unavailable {
                sku: line.sku.clone(),
            });
        }
        if line.quantity > line.stock {
            return Err(CheckoutError::InsufficientStock {
                sku: line.sku.clone(),
                available: line.stock.max(0),
            });
        }
    }
    Ok(())
}

fn order_items(lines: &[CartLine], cart: &CartView) -> Vec<NewOrderItem> {
    lines
        .iter()
        .zip(&cart.items)
        .map(|(line, priced)| NewOrderItem {
            product_id: line.product_id,
            variant_id: line.variant_id,
            product_name: line.product_name.clone(),
            variant_name: line.variant_name.clone(),
            sku: line.sku.clone(),
            unit_price: priced.unit_price,
            quantity: line.quantity,
            line_total: priced.line_total,
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use roastline_core::{ProductId, VariantId};

    use super::*;

    fn line(sku: &str, stock: i32, quantity: i32, available: bool) -> CartLine {
        CartLine {
            variant_id: VariantId::new(1),
            product_id: ProductId::new(1),
            product_name: "Kintamani Natural".to_string(),
            product_slug: "kintamani-natural".to_string(),
            variant_name: "200g".to_string(),
            sku: sku.to_string(),
            price: Decimal::from(100_000),
            b2b_price: Some(Decimal::from(80_000)),
            weight_grams: 200,
            stock,
            available,
            quantity,
        }
    }

    #[test]
    fn test_check_lines_ok() {
        assert!(check_lines(&[line("KIN-200", 5, 5, true)]).is_ok());
    }

    #[test]
    fn test_check_lines_unavailable() {
        let err = check_lines(&[line("KIN-200", 5, 1, false)]).unwrap_err();
        assert!(matches!(err, CheckoutError::Unavailable { sku } if sku == "KIN-200"));
    }

    #[test]
    fn test_check_lines_insufficient_stock() {
        let err = check_lines(&[line("KIN-200", 2, 3, true)]).unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::InsufficientStock { available: 2, .. }
        ));
    }

    #[test]
    fn test_order_items_use_tier_prices() {
        let lines = [line("KIN-200", 5, 2, true)];
        let cart = CartView::price(&lines, CustomerTier::B2b, Decimal::from(15)).unwrap();
        let items = order_items(&lines, &cart);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].unit_price, Decimal::from(80_000));
        assert_eq!(items[0].line_total, Decimal::from(160_000));
        assert_eq!(items[0].sku, "KIN-200");
    }

    #[test]
    fn test_checkout_request_optional_fields() {
        let request: CheckoutRequest = serde_json::from_str(
            r#"{"address_id": 4, "courier": "jne", "service": "REG"}"#,
        )
        .unwrap();
        assert_eq!(request.address_id, AddressId::new(4));
        assert!(request.voucher_code.is_none());
    }
}
