//! Like / unlike handlers.
//!
//! The existence checks here only produce friendly 400s. Two concurrent likes
//! can both pass them; the storage layer's unique `(user, post)` constraint
//! then rejects the second insert, which is reported the same way.

use actix_web::{HttpResponse, web};

use blog_core::RepoError;
use blog_core::domain::NewPostLike;
use blog_shared::dto::PostLikeResponse;

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const POST_NOT_FOUND: &str = "Post not found";
const ALREADY_LIKED: &str = "You already liked this post";
const NOT_LIKED: &str = "You haven't liked this post";

/// POST /likes/{id}/
pub async fn like_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();

    if state.posts.find_by_id(post_id).await?.is_none() {
        return Err(AppError::BadRequest(POST_NOT_FOUND.to_string()));
    }

    if state
        .likes
        .find_by_user_and_post(identity.user_id, post_id)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest(ALREADY_LIKED.to_string()));
    }

    let like = state
        .likes
        .create(NewPostLike {
            user_id: identity.user_id,
            post_id,
        })
        .await
        .map_err(|e| match e {
            RepoError::Duplicate(_) => {
                tracing::debug!(post_id, user_id = %identity.user_id, "Lost duplicate like race");
                AppError::BadRequest(ALREADY_LIKED.to_string())
            }
            // The post was deleted between the check and the insert.
            RepoError::Constraint(_) => AppError::BadRequest(POST_NOT_FOUND.to_string()),
            other => other.into(),
        })?;

    tracing::info!(post_id, user_id = %identity.user_id, "Post liked");

    Ok(HttpResponse::Created().json(PostLikeResponse {
        id: like.id,
        user: like.user_id,
        post: like.post_id,
    }))
}

/// DELETE /likes/{id}/
pub async fn unlike_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();

    let like = state
        .likes
        .find_by_user_and_post(identity.user_id, post_id)
        .await?
        .ok_or_else(|| AppError::BadRequest(NOT_LIKED.to_string()))?;

    state.likes.delete(like.id).await.map_err(|e| match e {
        RepoError::NotFound => AppError::BadRequest(NOT_LIKED.to_string()),
        other => other.into(),
    })?;

    tracing::info!(post_id, user_id = %identity.user_id, "Post unliked");

    Ok(HttpResponse::NoContent().finish())
}
