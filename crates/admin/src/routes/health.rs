//! Liveness and readiness probes.

use axum::{extract::State, http::StatusCode};

use crate::state::AppState;

/// Liveness check. Does not touch the database.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness check: 503 when the database is unreachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if let Err(e) = sqlx::query("SELECT 1").execute(state.pool()).await {
        tracing::warn!(error = %e, "Admin readiness check failed");
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    StatusCode::OK
}
