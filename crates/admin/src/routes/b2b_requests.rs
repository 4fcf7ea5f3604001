//! Business account review.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use roastline_core::{B2bRequestId, B2bRequestStatus};

use super::paginated;
use crate::db::{B2bReviewRepository, Page};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdminAuth, RequireWriter};
use crate::models::{B2bRequest, Paginated};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct B2bRequestQuery {
    pub status: Option<B2bRequestStatus>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Body of the approve and reject actions.
#[derive(Debug, Default, Deserialize)]
pub struct ReviewRequest {
    #[serde(default)]
    pub note: Option<String>,
}

impl ReviewRequest {
    fn note(&self) -> Option<&str> {
        self.note.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}

/// Requests oldest first, so the queue reads top to bottom.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Query(query): Query<B2bRequestQuery>,
) -> Result<Json<Paginated<B2bRequest>>> {
    let page = Page::new(query.page, query.per_page);
    let (items, total) = B2bReviewRepository::new(state.pool())
        .list(query.status, page)
        .await?;
    Ok(Json(paginated(items, total, page)))
}

#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<B2bRequestId>,
) -> Result<Json<B2bRequest>> {
    B2bReviewRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("b2b request {id}")))
}

/// Approve and move the customer to B2B pricing.
#[instrument(skip(state, admin, body))]
pub async fn approve(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<B2bRequestId>,
    body: Option<Json<ReviewRequest>>,
) -> Result<Json<B2bRequest>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let request = B2bReviewRepository::new(state.pool())
        .approve(id, admin.id, body.note())
        .await?;
    Ok(Json(request))
}

#[instrument(skip(state, admin, body))]
pub async fn reject(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<B2bRequestId>,
    body: Option<Json<ReviewRequest>>,
) -> Result<Json<B2bRequest>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let request = B2bReviewRepository::new(state.pool())
        .reject(id, admin.id, body.note())
        .await?;
    Ok(Json(request))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_note_is_dropped() {
        let blank = ReviewRequest {
            note: Some("   ".to_string()),
        };
        assert_eq!(blank.note(), None);

        let note = ReviewRequest {
            note: Some(" roastery cafe, verified ".to_string()),
        };
        assert_eq!(note.note(), Some("roastery cafe, verified"));
    }
}
