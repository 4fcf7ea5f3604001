//! Staff login and logout.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument};

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAdminAuth, clear_current_admin, set_current_admin};
use crate::models::{AdminUser, CurrentAdmin};
use crate::services::auth::AdminAuthService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Log in with email and password. The session ID is rotated.
#[instrument(skip(state, session, body), fields(email = %body.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AdminUser>> {
    let admin = AdminAuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await?;

    set_current_admin(&session, &CurrentAdmin::from(&admin))
        .await
        .map_err(|e| AppError::Internal(format!("session write failed: {e}")))?;
    set_sentry_user(&admin.id, Some(admin.email.as_str()));

    info!(admin_id = %admin.id, role = %admin.role, "Admin logged in");
    Ok(Json(admin))
}

#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_admin(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session flush failed: {e}")))?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The logged-in admin, read fresh from the database.
#[instrument(skip(state, current))]
pub async fn me(
    State(state): State<AppState>,
    RequireAdminAuth(current): RequireAdminAuth,
) -> Result<Json<AdminUser>> {
    let admin = AdminAuthService::new(state.pool())
        .get_admin(current.id)
        .await?;
    Ok(Json(admin))
}
