//! Story editing and publishing. Drafts are only visible here.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::{info, instrument};

use roastline_core::StoryId;

use super::{PageQuery, paginated};
use crate::db::StoryAdminRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdminAuth, RequireWriter};
use crate::models::{Paginated, Story, StoryInput};
use crate::state::AppState;

#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<Story>>> {
    let page = query.page();
    let (items, total) = StoryAdminRepository::new(state.pool()).list(page).await?;
    Ok(Json(paginated(items, total, page)))
}

#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<StoryId>,
) -> Result<Json<Story>> {
    StoryAdminRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("story {id}")))
}

/// Create a story as an unpublished draft.
#[instrument(skip(state, admin, body))]
pub async fn create(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Json(body): Json<StoryInput>,
) -> Result<(StatusCode, Json<Story>)> {
    let input = body.validate().map_err(AppError::BadRequest)?;
    let story = StoryAdminRepository::new(state.pool())
        .create(&input)
        .await?;

    info!(admin_id = %admin.id, story_id = %story.id, slug = %story.slug, "Story created");
    Ok((StatusCode::CREATED, Json(story)))
}

#[instrument(skip(state, admin, body))]
pub async fn update(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<StoryId>,
    Json(body): Json<StoryInput>,
) -> Result<Json<Story>> {
    let input = body.validate().map_err(AppError::BadRequest)?;
    let story = StoryAdminRepository::new(state.pool())
        .update(id, &input)
        .await?;

    info!(admin_id = %admin.id, story_id = %id, "Story updated");
    Ok(Json(story))
}

#[instrument(skip(state, admin))]
pub async fn delete(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<StoryId>,
) -> Result<StatusCode> {
    StoryAdminRepository::new(state.pool()).delete(id).await?;

    info!(admin_id = %admin.id, story_id = %id, "Story deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Publish. A story keeps its first publication date when republished.
#[instrument(skip(state, admin))]
pub async fn publish(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<StoryId>,
) -> Result<Json<Story>> {
    let story = StoryAdminRepository::new(state.pool()).publish(id).await?;

    info!(admin_id = %admin.id, story_id = %id, "Story published");
    Ok(Json(story))
}

#[instrument(skip(state, admin))]
pub async fn unpublish(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<StoryId>,
) -> Result<Json<Story>> {
    let story = StoryAdminRepository::new(state.pool()).unpublish(id).await?;

    info!(admin_id = %admin.id, story_id = %id, "Story unpublished");
    Ok(Json(story))
}
