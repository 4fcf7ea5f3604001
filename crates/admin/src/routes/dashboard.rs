//! Dashboard summary.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::db::DashboardRepository;
use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::models::DashboardStats;
use crate::state::AppState;

#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
) -> Result<Json<DashboardStats>> {
    let stats = DashboardRepository::new(state.pool()).stats().await?;
    Ok(Json(stats))
}
