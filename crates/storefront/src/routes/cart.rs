//! Cart route handlers.
//!
//! Every handler returns the full priced cart so clients can re-render from
//! one response.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tracing::instrument;

use roastline_core::VariantId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::CartView;
use crate::services::cart::CartService;
use crate::state::AppState;

/// Body of `POST /cart/items`.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub variant_id: VariantId,
    pub quantity: i32,
}

/// Body of `PATCH /cart/items/{variant_id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

fn service(state: &AppState) -> CartService<'_> {
    CartService::new(state.pool(), state.config().b2b_discount_percent)
}

/// The priced cart.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartView>> {
    Ok(Json(service(&state).view(user.id).await?))
}

/// Add a variant on top of the quantity already in the cart.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<AddItemRequest>,
) -> Result<Json<CartView>> {
    let cart = service(&state)
        .add_item(user.id, body.variant_id, body.quantity)
        .await?;
    Ok(Json(cart))
}

/// Set the quantity of a line.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(variant_id): Path<VariantId>,
    Json(body): Json<UpdateItemRequest>,
) -> Result<Json<CartView>> {
    let cart = service(&state)
        .set_quantity(user.id, variant_id, body.quantity)
        .await?;
    Ok(Json(cart))
}

/// Remove a line.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(variant_id): Path<VariantId>,
) -> Result<Json<CartView>> {
    Ok(Json(service(&state).remove(user.id, variant_id).await?))
}

/// Empty the cart.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartView>> {
    Ok(Json(service(&state).clear(user.id).await?))
}
