//! Published stories (origin notes, brew guides, roastery news).

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Serialize;
use tracing::instrument;

use super::PageQuery;
use crate::db::StoryRepository;
use crate::error::{AppError, Result};
use crate::models::{Paginated, Story, StorySummary};
use crate::services::markdown::render_markdown;
use crate::state::AppState;

/// A story with its body rendered to HTML.
#[derive(Debug, Serialize)]
pub struct StoryView {
    #[serde(flatten)]
    pub story: Story,
    pub body_html: String,
}

impl From<Story> for StoryView {
    fn from(story: Story) -> Self {
        Self {
            body_html: render_markdown(&story.body_markdown),
            story,
        }
    }
}

/// Published stories, newest first.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<StorySummary>>> {
    let page = query.page();
    let (items, total) = StoryRepository::new(state.pool())
        .list_published(page)
        .await?;

    Ok(Json(Paginated {
        items,
        page: page.page,
        per_page: page.per_page,
        total,
    }))
}

/// One published story.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<StoryView>> {
    let story = StoryRepository::new(state.pool())
        .get_published_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Story {slug} not found")))?;
    Ok(Json(story.into()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use roastline_core::StoryId;

    use super::*;

    #[test]
    fn test_story_view_renders_body() {
        let story = Story {
            id: StoryId::new(1),
            title: "Visiting Gayo".to_string(),
            slug: "visiting-gayo".to_string(),
            excerpt: "Harvest season in Aceh.".to_string(),
            body_markdown: "## Harvest\n\nCherries <script>x</script>".to_string(),
            cover_image_url: None,
            published_at: Some(Utc::now()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let view = StoryView::from(story);
        assert!(view.body_html.contains("<h2"));
        assert!(!view.body_html.contains("<script>"));

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["slug"], "visiting-gayo");
        assert!(json["body_html"].is_string());
    }
}
