//! Account route handlers: order history and address book.
//!
//! All handlers require a logged-in customer and only ever touch that
//! customer's rows. Someone else's order or address is a 404.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::{info, instrument};

use roastline_core::{AddressId, OrderStatus, UserId};

use super::PageQuery;
use crate::db::{AddressRepository, OrderRepository, TransactionRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Address, AddressInput, Order, OrderDetail, OrderSummary, Paginated};
use crate::services::checkout::{CheckoutService, PlacedOrder};
use crate::state::AppState;

// =============================================================================
// Orders
// =============================================================================

/// Order history, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<OrderSummary>>> {
    let page = query.page();
    let (items, total) = OrderRepository::new(state.pool())
        .list_for_customer(user.id, page)
        .await?;

    Ok(Json(Paginated {
        items,
        page: page.page,
        per_page: page.per_page,
        total,
    }))
}

/// One order with its items and payment status.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(number): Path<String>,
) -> Result<Json<OrderDetail>> {
    let repo = OrderRepository::new(state.pool());
    let order = own_order(&repo, user.id, &number).await?;
    let items = repo.items(order.id).await?;
    let payment = TransactionRepository::new(state.pool())
        .get_for_order(order.id)
        .await?;

    Ok(Json(OrderDetail {
        order,
        items,
        payment,
    }))
}

/// Cancel an order that has not been paid yet.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn cancel_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(number): Path<String>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .cancel_pending(&number, user.id)
        .await?;
    info!(order_number = %order.order_number, "Order cancelled by customer");
    Ok(Json(order))
}

/// Issue a fresh payment token for a pending order.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn pay_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(number): Path<String>,
) -> Result<Json<PlacedOrder>> {
    let order = own_order(&OrderRepository::new(state.pool()), user.id, &number).await?;
    if order.status != OrderStatus::Pending {
        return Err(AppError::Conflict(format!(
            "Order {number} is {} and cannot be paid",
            order.status
        )));
    }

    let token = CheckoutService::new(&state)
        .request_payment(&order, user.email.as_str())
        .await?;

    Ok(Json(PlacedOrder {
        order_number: order.order_number,
        total: order.total,
        payment_token: token.token,
        redirect_url: token.redirect_url,
    }))
}

async fn own_order(
    repo: &OrderRepository<'_>,
    customer_id: UserId,
    number: &str,
) -> Result<Order> {
    repo.get_for_customer(customer_id, number)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {number} not found")))
}

// =============================================================================
// Addresses
// =============================================================================

/// The address book, default first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn addresses(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Address>>> {
    let addresses = AddressRepository::new(state.pool()).list(user.id).await?;
    Ok(Json(addresses))
}

/// Add an address. The first one becomes the default.
#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn create_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<AddressInput>,
) -> Result<(StatusCode, Json<Address>)> {
    let input = input.normalized().map_err(AppError::BadRequest)?;
    let address = AddressRepository::new(state.pool())
        .create(user.id, &input)
        .await?;
    Ok((StatusCode::CREATED, Json(address)))
}

/// Replace an address.
#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn update_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
    Json(input): Json<AddressInput>,
) -> Result<Json<Address>> {
    let input = input.normalized().map_err(AppError::BadRequest)?;
    let address = AddressRepository::new(state.pool())
        .update(user.id, id, &input)
        .await?;
    Ok(Json(address))
}

/// Delete an address. If it was the default, the newest remaining one takes
/// over.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<StatusCode> {
    AddressRepository::new(state.pool())
        .delete(user.id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Make an address the default.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn set_default_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Json<Address>> {
    let address = AddressRepository::new(state.pool())
        .set_default(user.id, id)
        .await?;
    Ok(Json(address))
}
