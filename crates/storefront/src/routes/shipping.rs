//! Shipping rate route handler.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::services::shipping::ShippingRate;
use crate::state::AppState;

/// Query parameters for `GET /shipping/rates`.
#[derive(Debug, Deserialize)]
pub struct RatesQuery {
    /// Destination city ID of the rate API.
    pub destination: String,
    /// Parcel weight in grams.
    pub weight: i32,
}

/// Rates from every configured courier.
///
/// A courier that fails is skipped; only a total failure is an error.
#[instrument(skip(state))]
pub async fn rates(
    State(state): State<AppState>,
    Query(query): Query<RatesQuery>,
) -> Result<Json<Vec<ShippingRate>>> {
    let destination = query.destination.trim();
    if destination.is_empty() {
        return Err(AppError::BadRequest("destination is required".to_string()));
    }

    let rates = state
        .shipping()
        .rates_for_all_couriers(destination, query.weight.max(1))
        .await?;
    Ok(Json(rates))
}
