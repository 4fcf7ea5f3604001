//! Voucher management.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::{info, instrument};

use roastline_core::VoucherId;

use super::{PageQuery, paginated};
use crate::db::VoucherAdminRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdminAuth, RequireWriter};
use crate::models::{Paginated, Voucher, VoucherInput};
use crate::state::AppState;

#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<Voucher>>> {
    let page = query.page();
    let (items, total) = VoucherAdminRepository::new(state.pool())
        .list(page)
        .await?;
    Ok(Json(paginated(items, total, page)))
}

#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<VoucherId>,
) -> Result<Json<Voucher>> {
    VoucherAdminRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("voucher {id}")))
}

#[instrument(skip(state, admin, body), fields(code = %body.code))]
pub async fn create(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Json(body): Json<VoucherInput>,
) -> Result<(StatusCode, Json<Voucher>)> {
    let input = body.validate().map_err(AppError::BadRequest)?;
    let voucher = VoucherAdminRepository::new(state.pool())
        .create(&input)
        .await?;

    info!(admin_id = %admin.id, voucher_id = %voucher.id, code = %voucher.code, "Voucher created");
    Ok((StatusCode::CREATED, Json(voucher)))
}

#[instrument(skip(state, admin, body))]
pub async fn update(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<VoucherId>,
    Json(body): Json<VoucherInput>,
) -> Result<Json<Voucher>> {
    let input = body.validate().map_err(AppError::BadRequest)?;
    let voucher = VoucherAdminRepository::new(state.pool())
        .update(id, &input)
        .await?;

    info!(admin_id = %admin.id, voucher_id = %id, "Voucher updated");
    Ok(Json(voucher))
}

#[instrument(skip(state, admin))]
pub async fn deactivate(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<VoucherId>,
) -> Result<Json<Voucher>> {
    let voucher = VoucherAdminRepository::new(state.pool())
        .deactivate(id)
        .await?;

    info!(admin_id = %admin.id, voucher_id = %id, "Voucher deactivated");
    Ok(Json(voucher))
}
