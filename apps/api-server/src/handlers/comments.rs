//! Comments-by-post handlers.

use actix_web::{HttpResponse, web};

use blog_core::DomainError;
use blog_core::domain::{Comment, NewComment};
use blog_shared::dto::{CommentResponse, CreateCommentRequest};

use super::display_name;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

async fn render(state: &AppState, comment: Comment) -> AppResult<CommentResponse> {
    Ok(CommentResponse {
        id: comment.id,
        author: display_name(state, comment.author_id).await?,
        text: comment.text,
        post: comment.post_id,
    })
}

async fn ensure_post_exists(state: &AppState, post_id: i64) -> AppResult<()> {
    match state.posts.find_by_id(post_id).await? {
        Some(_) => Ok(()),
        None => Err(DomainError::not_found("Post", post_id).into()),
    }
}

/// GET /comments/{post_id}/
///
/// An existing post without comments yields an empty list.
pub async fn list_comments(
    state: web::Data<AppState>,
    _identity: Identity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    ensure_post_exists(&state, post_id).await?;

    let comments = state.comments.list_by_post(post_id).await?;

    let mut body = Vec::with_capacity(comments.len());
    for comment in comments {
        body.push(render(&state, comment).await?);
    }

    Ok(HttpResponse::Ok().json(body))
}

/// POST /comments/{post_id}/
///
/// The parent post comes from the path and the author from the token.
pub async fn create_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
    body: web::Json<CreateCommentRequest>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    ensure_post_exists(&state, post_id).await?;

    let new_comment = NewComment::new(identity.user_id, post_id, body.into_inner().text);
    let comment = state.comments.create(new_comment).await?;

    tracing::info!(comment_id = comment.id, post_id, "Comment created");

    Ok(HttpResponse::Created().json(render(&state, comment).await?))
}
