//! Checkout and voucher route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::checkout::{
    CheckoutPreview, CheckoutRequest, CheckoutService, PlacedOrder, VoucherQuote,
};
use crate::state::AppState;

/// Body of `POST /vouchers/validate`.
#[derive(Debug, Deserialize)]
pub struct ValidateVoucherRequest {
    pub code: String,
}

/// Place an order from the cart and open a payment.
///
/// If the gateway fails after the order is saved the response is 502 and
/// the order stays pending for `POST /account/orders/{number}/pay`.
#[instrument(skip(state, user, body), fields(user_id = %user.id, courier = %body.courier))]
pub async fn place_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<PlacedOrder>)> {
    let placed = CheckoutService::new(&state)
        .place_order(user.id, user.email.as_str(), &body)
        .await?;
    Ok((StatusCode::CREATED, Json(placed)))
}

/// Price an order without placing it.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn preview(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<CheckoutRequest>,
) -> Result<Json<CheckoutPreview>> {
    let preview = CheckoutService::new(&state).preview(user.id, &body).await?;
    Ok(Json(preview))
}

/// Check a voucher code against the current cart.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn validate_voucher(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<ValidateVoucherRequest>,
) -> Result<Json<VoucherQuote>> {
    let quote = CheckoutService::new(&state)
        .quote_voucher(user.id, &body.code)
        .await?;
    Ok(Json(quote))
}
