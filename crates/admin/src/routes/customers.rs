//! Customer lookup and tier changes.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::{info, instrument};

use roastline_core::{CustomerTier, UserId};

use super::paginated;
use crate::db::{CustomerRepository, Page};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdminAuth, RequireWriter};
use crate::models::{CustomerDetail, Paginated, SetTierRequest, User};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CustomerQuery {
    pub q: Option<String>,
    pub tier: Option<CustomerTier>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Query(query): Query<CustomerQuery>,
) -> Result<Json<Paginated<User>>> {
    let page = Page::new(query.page, query.per_page);
    let (items, total) = CustomerRepository::new(state.pool())
        .list(query.q.as_deref(), query.tier, page)
        .await?;
    Ok(Json(paginated(items, total, page)))
}

#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<UserId>,
) -> Result<Json<CustomerDetail>> {
    CustomerRepository::new(state.pool())
        .detail(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("customer {id}")))
}

/// Set the pricing tier directly, bypassing the request queue.
#[instrument(skip(state, admin, body), fields(tier = %body.tier))]
pub async fn set_tier(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<UserId>,
    Json(body): Json<SetTierRequest>,
) -> Result<Json<User>> {
    let user = CustomerRepository::new(state.pool())
        .set_tier(id, body.tier)
        .await?;

    info!(admin_id = %admin.id, customer_id = %id, tier = %user.tier, "Customer tier changed");
    Ok(Json(user))
}
