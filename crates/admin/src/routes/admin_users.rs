//! Staff account management. Super admins only.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::{info, instrument};

use roastline_core::{AdminRole, AdminUserId};

use crate::db::AdminUserRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireSuperAdmin;
use crate::models::AdminUser;
use crate::services::auth::{AdminAuthService, NewAdmin};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateAdminRequest {
    pub email: String,
    pub name: String,
    pub role: AdminRole,
    pub password: String,
}

#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireSuperAdmin(_admin): RequireSuperAdmin,
) -> Result<Json<Vec<AdminUser>>> {
    let users = AdminUserRepository::new(state.pool()).list_all().await?;
    Ok(Json(users))
}

#[instrument(skip(state, admin, body), fields(email = %body.email, role = %body.role))]
pub async fn create(
    State(state): State<AppState>,
    RequireSuperAdmin(admin): RequireSuperAdmin,
    Json(body): Json<CreateAdminRequest>,
) -> Result<(StatusCode, Json<AdminUser>)> {
    let created = AdminAuthService::new(state.pool())
        .create_admin(&NewAdmin {
            email: &body.email,
            name: &body.name,
            role: body.role,
            password: &body.password,
        })
        .await?;

    info!(created_by = %admin.id, admin_id = %created.id, "Admin account created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// Delete a staff account. Deleting your own account is refused.
#[instrument(skip(state, admin))]
pub async fn delete(
    State(state): State<AppState>,
    RequireSuperAdmin(admin): RequireSuperAdmin,
    Path(id): Path<AdminUserId>,
) -> Result<StatusCode> {
    if id == admin.id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }

    AdminUserRepository::new(state.pool()).delete(id).await?;
    info!(deleted_by = %admin.id, admin_id = %id, "Admin account deleted");
    Ok(StatusCode::NO_CONTENT)
}
