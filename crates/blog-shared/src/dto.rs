//! Data Transfer Objects - request/response types for the API.
//!
//! Request types never carry an author: the server always takes it from the
//! bearer token, and unknown fields in a body are ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Request to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub password: String,
}

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response containing a user's public information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
}

/// Response containing authentication tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Body of `POST /posts/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub published_date: Option<DateTime<Utc>>,
}

/// Body of `PUT /posts/{id}/`. Absent fields are left unchanged;
/// `"content": null` clears the content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub content: Option<Option<String>>,
    #[serde(default)]
    pub published_date: Option<DateTime<Utc>>,
}

/// Marks a field as present even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub content: Option<String>,
    /// Display name of the author.
    pub author: String,
    pub published_date: DateTime<Utc>,
    pub like_count: u64,
}

/// Body of `POST /comments/{post_id}/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: i64,
    pub author: String,
    pub text: Option<String>,
    pub post: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostLikeResponse {
    pub id: i64,
    pub user: Uuid,
    pub post: i64,
}
