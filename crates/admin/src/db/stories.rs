//! Story editing and publication.

use sqlx::PgPool;

use roastline_core::StoryId;
use roastline_storefront::db::stories::STORY_COLUMNS;

use super::{Page, RepositoryError};
use crate::models::{Story, StoryInput};

pub struct StoryAdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoryAdminRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Drafts and published stories, most recently edited first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, page: Page) -> Result<(Vec<Story>, i64), RepositoryError> {
        let stories = sqlx::query_as::<_, Story>(&format!(
            r"
            SELECT {STORY_COLUMNS} FROM shop.story
            ORDER BY updated_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM shop.story")
            .fetch_one(self.pool)
            .await?;

        Ok((stories, total))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: StoryId) -> Result<Option<Story>, RepositoryError> {
        let story = sqlx::query_as::<_, Story>(&format!(
            "SELECT {STORY_COLUMNS} FROM shop.story WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(story)
    }

    /// Create an unpublished story.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create(&self, input: &StoryInput) -> Result<Story, RepositoryError> {
        sqlx::query_as::<_, Story>(&format!(
            r"
            INSERT INTO shop.story (title, slug, excerpt, body_markdown, cover_image_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {STORY_COLUMNS}
            "
        ))
        .bind(&input.title)
        .bind(input.slug())
        .bind(&input.excerpt)
        .bind(&input.body_markdown)
        .bind(input.cover_image_url.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, "story slug"))
    }

    /// Replace a story's content. Publication state is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown story and
    /// `RepositoryError::Conflict` if the slug is taken.
    pub async fn update(&self, id: StoryId, input: &StoryInput) -> Result<Story, RepositoryError> {
        sqlx::query_as::<_, Story>(&format!(
            r"
            UPDATE shop.story
            SET title = $2, slug = $3, excerpt = $4, body_markdown = $5,
                cover_image_url = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING {STORY_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&input.title)
        .bind(input.slug())
        .bind(&input.excerpt)
        .bind(&input.body_markdown)
        .bind(input.cover_image_url.as_deref())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, "story slug"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown story.
    pub async fn delete(&self, id: StoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.story WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Publish now, or keep the original date if already published.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown story.
    pub async fn publish(&self, id: StoryId) -> Result<Story, RepositoryError> {
        self.set_published(id, "COALESCE(published_at, NOW())").await
    }

    /// Take a story off the storefront.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown story.
    pub async fn unpublish(&self, id: StoryId) -> Result<Story, RepositoryError> {
        self.set_published(id, "NULL").await
    }

    async fn set_published(&self, id: StoryId, value: &'static str) -> Result<Story, RepositoryError> {
        sqlx::query_as::<_, Story>(&format!(
            r"
            UPDATE shop.story SET published_at = {value}, updated_at = NOW()
            WHERE id = $1
            RETURNING {STORY_COLUMNS}
            "
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }
}
