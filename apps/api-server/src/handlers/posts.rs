//! Post collection and detail handlers.

use actix_web::{HttpRequest, HttpResponse, web};

use blog_core::DomainError;
use blog_core::domain::{NewPost, Post, PostChanges};
use blog_core::policy;
use blog_shared::dto::{CreatePostRequest, PostResponse, UpdatePostRequest};

use super::display_name;
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Serialize a post with its author's name and a fresh like count.
async fn render(state: &AppState, post: Post) -> AppResult<PostResponse> {
    let author = display_name(state, post.author_id).await?;
    let like_count = state.likes.count_for_post(post.id).await?;

    Ok(PostResponse {
        id: post.id,
        title: post.title,
        content: post.content,
        author,
        published_date: post.published_date,
        like_count,
    })
}

async fn fetch(state: &AppState, id: i64) -> AppResult<Post> {
    state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found("Post", id).into())
}

/// Apply the owner-or-read-only rule for this request's method.
fn authorize(req: &HttpRequest, identity: &Identity, post: &Post) -> AppResult<()> {
    let safe = policy::is_safe_method(req.method().as_str());

    if policy::owner_or_read_only(safe, identity.user_id, post.author_id).is_permitted() {
        return Ok(());
    }

    tracing::warn!(
        post_id = post.id,
        user_id = %identity.user_id,
        method = %req.method(),
        "Rejected write by non-owner"
    );
    Err(AppError::Forbidden)
}

/// GET /posts/
pub async fn list_posts(state: web::Data<AppState>, _identity: Identity) -> AppResult<HttpResponse> {
    let posts = state.posts.list().await?;

    let mut body = Vec::with_capacity(posts.len());
    for post in posts {
        body.push(render(&state, post).await?);
    }

    Ok(HttpResponse::Ok().json(body))
}

/// POST /posts/
///
/// The author is always the caller; any author supplied in the body is ignored.
pub async fn create_post(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let new_post = NewPost::new(identity.user_id, req.title, req.content, req.published_date)?;
    let post = state.posts.create(new_post).await?;

    tracing::info!(post_id = post.id, author_id = %identity.user_id, "Post created");

    Ok(HttpResponse::Created().json(render(&state, post).await?))
}

/// GET /posts/{id}/
pub async fn get_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let post = fetch(&state, path.into_inner()).await?;
    authorize(&req, &identity, &post)?;

    Ok(HttpResponse::Ok().json(render(&state, post).await?))
}

/// PUT /posts/{id}/ - author only.
pub async fn update_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let mut post = fetch(&state, path.into_inner()).await?;
    authorize(&req, &identity, &post)?;

    let changes = body.into_inner();
    post.apply(PostChanges {
        title: changes.title,
        content: changes.content,
        published_date: changes.published_date,
    })?;
    let post = state.posts.update(post).await?;

    tracing::info!(post_id = post.id, "Post updated");

    Ok(HttpResponse::Ok().json(render(&state, post).await?))
}

/// DELETE /posts/{id}/ - author only. Comments and likes go with the post.
pub async fn delete_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let post = fetch(&state, path.into_inner()).await?;
    authorize(&req, &identity, &post)?;

    state.posts.delete(post.id).await?;

    tracing::info!(post_id = post.id, "Post deleted");

    Ok(HttpResponse::NoContent().finish())
}
