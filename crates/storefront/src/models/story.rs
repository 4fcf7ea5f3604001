//! Coffee stories (origin notes, brewing guides).

use chrono::{DateTime, Utc};
use serde::Serialize;

use roastline_core::StoryId;

/// Story as listed on the index.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StorySummary {
    pub id: StoryId,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub cover_image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// A full story row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Story {
    pub id: StoryId,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub body_markdown: String,
    pub cover_image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
