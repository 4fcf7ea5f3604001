//! Published stories.

use sqlx::PgPool;

use super::{Page, RepositoryError};
use crate::models::{Story, StorySummary};

pub const STORY_COLUMNS: &str = "id, title, slug, excerpt, body_markdown, cover_image_url, \
     published_at, created_at, updated_at";

pub struct StoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoryRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Published stories, newest first, and the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_published(
        &self,
        page: Page,
    ) -> Result<(Vec<StorySummary>, i64), RepositoryError> {
        let stories = sqlx::query_as::<_, StorySummary>(
            r"
            SELECT id, title, slug, excerpt, cover_image_url, published_at
            FROM shop.story
            WHERE published_at IS NOT NULL AND published_at <= NOW()
            ORDER BY published_at DESC, id DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM shop.story WHERE published_at IS NOT NULL AND published_at <= NOW()",
        )
        .fetch_one(self.pool)
        .await?;

        Ok((stories, total))
    }

    /// A published story by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_published_by_slug(&self, slug: &str) -> Result<Option<Story>, RepositoryError> {
        let story = sqlx::query_as::<_, Story>(&format!(
            r"
            SELECT {STORY_COLUMNS} FROM shop.story
            WHERE slug = $1 AND published_at IS NOT NULL AND published_at <= NOW()
            "
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;
        Ok(story)
    }
}
