//! Business account upgrade requests.

use axum::{Json, extract::State, http::StatusCode};
use tracing::{info, instrument};

use roastline_core::CustomerTier;

use crate::db::{B2bRequestRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{B2bRequest, B2bRequestInput};
use crate::state::AppState;

/// Ask for a business account. Staff review it in the back office.
#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn create_request(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<B2bRequestInput>,
) -> Result<(StatusCode, Json<B2bRequest>)> {
    let input = input.normalized().map_err(AppError::BadRequest)?;

    if UserRepository::new(state.pool()).get_tier(user.id).await? == CustomerTier::B2b {
        return Err(AppError::Conflict(
            "already a business customer".to_string(),
        ));
    }

    let repo = B2bRequestRepository::new(state.pool());
    if repo.has_pending(user.id).await? {
        return Err(AppError::Conflict("pending request already exists".to_string()));
    }

    // The partial unique index catches a concurrent duplicate as a Conflict.
    let request = repo.create(user.id, &input).await?;
    info!(request_id = %request.id, company = %request.company_name, "B2B request submitted");
    Ok((StatusCode::CREATED, Json(request)))
}

/// The customer's own requests, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list_requests(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<B2bRequest>>> {
    let requests = B2bRequestRepository::new(state.pool())
        .list_for_customer(user.id)
        .await?;
    Ok(Json(requests))
}
