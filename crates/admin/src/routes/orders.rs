//! Order lookup and fulfilment.
//!
//! Every status change goes through [`FulfilmentService`], which locks the
//! order row and applies stock and voucher effects in the same transaction.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use roastline_core::OrderStatus;

use super::paginated;
use crate::db::{OrderAdminRepository, OrderFilter, Page};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdminAuth, RequireWriter};
use crate::models::{AdminOrderDetail, CancelRequest, Order, OrderListRow, Paginated, ShipRequest};
use crate::services::fulfilment::FulfilmentService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
    pub q: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Paginated<OrderListRow>>> {
    let page = Page::new(query.page, query.per_page);
    let filter = OrderFilter {
        status: query.status,
        query: query.q,
    };
    let (items, total) = OrderAdminRepository::new(state.pool())
        .list(&filter, page)
        .await?;
    Ok(Json(paginated(items, total, page)))
}

#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(number): Path<String>,
) -> Result<Json<AdminOrderDetail>> {
    OrderAdminRepository::new(state.pool())
        .detail(&number)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("order {number}")))
}

#[instrument(skip(state, admin))]
pub async fn process(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(number): Path<String>,
) -> Result<Json<Order>> {
    let order = FulfilmentService::new(state.pool(), admin.id)
        .process(&number)
        .await?;
    Ok(Json(order))
}

#[instrument(skip(state, admin, body))]
pub async fn ship(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(number): Path<String>,
    Json(body): Json<ShipRequest>,
) -> Result<Json<Order>> {
    let order = FulfilmentService::new(state.pool(), admin.id)
        .ship(&number, &body.tracking_number)
        .await?;
    Ok(Json(order))
}

#[instrument(skip(state, admin))]
pub async fn deliver(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(number): Path<String>,
) -> Result<Json<Order>> {
    let order = FulfilmentService::new(state.pool(), admin.id)
        .deliver(&number)
        .await?;
    Ok(Json(order))
}

/// Cancel an order. The body is optional.
#[instrument(skip(state, admin, body))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(number): Path<String>,
    body: Option<Json<CancelRequest>>,
) -> Result<Json<Order>> {
    let reason = body.and_then(|Json(body)| body.reason);
    let order = FulfilmentService::new(state.pool(), admin.id)
        .cancel(&number, reason.as_deref())
        .await?;
    Ok(Json(order))
}
