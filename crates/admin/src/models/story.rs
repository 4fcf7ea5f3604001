//! Story management bodies.

use serde::Deserialize;

use roastline_core::slugify;

use super::catalog::{optional, required};

/// Body of `POST /stories` and `PUT /stories/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct StoryInput {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub excerpt: String,
    pub body_markdown: String,
    #[serde(default)]
    pub cover_image_url: Option<String>,
}

impl StoryInput {
    /// Trim fields and derive the slug from the title when absent.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(self) -> Result<Self, String> {
        let title = required("title", &self.title)?;
        let body_markdown = required("body_markdown", &self.body_markdown)?;
        let slug = slugify(self.slug.as_deref().map_or(title.as_str(), str::trim));
        if slug.is_empty() {
            return Err("slug must contain letters or digits".to_string());
        }

        Ok(Self {
            title,
            slug: Some(slug),
            excerpt: self.excerpt.trim().to_string(),
            body_markdown,
            cover_image_url: optional(self.cover_image_url),
        })
    }

    /// The settled slug. Only meaningful after [`Self::validate`].
    #[must_use]
    pub fn slug(&self) -> &str {
        self.slug.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_story_slug_from_title() {
        let story = StoryInput {
            title: "Brewing Toraja on a V60".to_string(),
            slug: None,
            excerpt: String::new(),
            body_markdown: "# Grind\nMedium fine.".to_string(),
            cover_image_url: Some(String::new()),
        }
        .validate()
        .unwrap();
        assert_eq!(story.slug(), "brewing-toraja-on-a-v60");
        assert_eq!(story.cover_image_url, None);
    }

    #[test]
    fn test_story_requires_body() {
        let err = StoryInput {
            title: "Empty".to_string(),
            slug: None,
            excerpt: String::new(),
            body_markdown: "  ".to_string(),
            cover_image_url: None,
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, "body_markdown is required");
    }
}
