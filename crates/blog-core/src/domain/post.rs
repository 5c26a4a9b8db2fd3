use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Maximum number of characters in a post title.
pub const TITLE_MAX_LEN: usize = 200;

/// Post entity - a blog post owned by its author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: Option<String>,
    pub author_id: Uuid,
    pub published_date: DateTime<Utc>,
}

/// A post that has not been persisted yet. The storage layer assigns the id.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: Option<String>,
    pub author_id: Uuid,
    pub published_date: DateTime<Utc>,
}

/// Field replacements applied by an update. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    /// `Some(None)` clears the content.
    pub content: Option<Option<String>>,
    pub published_date: Option<DateTime<Utc>>,
}

impl NewPost {
    /// Build a post owned by `author_id`. Defaults the publish date to now.
    pub fn new(
        author_id: Uuid,
        title: String,
        content: Option<String>,
        published_date: Option<DateTime<Utc>>,
    ) -> Result<Self, DomainError> {
        validate_title(&title)?;

        Ok(Self {
            title,
            content,
            author_id,
            published_date: published_date.unwrap_or_else(Utc::now),
        })
    }
}

impl Post {
    /// Apply a partial update. The author is never touched.
    pub fn apply(&mut self, changes: PostChanges) -> Result<(), DomainError> {
        if let Some(title) = changes.title {
            validate_title(&title)?;
            self.title = title;
        }
        if let Some(content) = changes.content {
            self.content = content;
        }
        if let Some(published_date) = changes.published_date {
            self.published_date = published_date;
        }
        Ok(())
    }
}

fn validate_title(title: &str) -> Result<(), DomainError> {
    if title.trim().is_empty() {
        return Err(DomainError::Validation("title may not be blank".to_string()));
    }
    if title.chars().count() > TITLE_MAX_LEN {
        return Err(DomainError::Validation(format!(
            "title may not exceed {TITLE_MAX_LEN} characters"
        )));
    }
    Ok(())
}
