use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single user's like on a post. At most one exists per `(user_id, post_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostLike {
    pub id: i64,
    pub user_id: Uuid,
    pub post_id: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct NewPostLike {
    pub user_id: Uuid,
    pub post_id: i64,
}
