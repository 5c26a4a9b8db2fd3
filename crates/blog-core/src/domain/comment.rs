use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Comment entity - attached to exactly one post, removed with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub author_id: Uuid,
    pub text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub post_id: i64,
}

/// A comment that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub author_id: Uuid,
    pub text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub post_id: i64,
}

impl NewComment {
    /// Create a comment stamped with the current time.
    pub fn new(author_id: Uuid, post_id: i64, text: Option<String>) -> Self {
        Self {
            author_id,
            text,
            created_at: Utc::now(),
            post_id,
        }
    }
}
