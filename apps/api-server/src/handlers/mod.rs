//! HTTP handlers and route configuration.

mod auth;
mod comments;
mod health;
mod likes;
mod posts;

#[cfg(test)]
mod tests;

use actix_web::web;
use uuid::Uuid;

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::NotFound(err.to_string()).into()),
    )
    // Public routes
    .route("/health", web::get().to(health::health_check))
    .service(
        web::scope("/auth")
            .route("/register/", web::post().to(auth::register))
            .route("/login/", web::post().to(auth::login))
            .route("/me/", web::get().to(auth::me)),
    )
    // Authenticated routes
    .service(
        web::resource("/posts/")
            .route(web::get().to(posts::list_posts))
            .route(web::post().to(posts::create_post)),
    )
    .service(
        web::resource("/posts/{id}/")
            .route(web::get().to(posts::get_post))
            .route(web::put().to(posts::update_post))
            .route(web::delete().to(posts::delete_post)),
    )
    .service(
        web::resource("/comments/{post_id}/")
            .route(web::get().to(comments::list_comments))
            .route(web::post().to(comments::create_comment)),
    )
    .service(
        web::resource("/likes/{id}/")
            .route(web::post().to(likes::like_post))
            .route(web::delete().to(likes::unlike_post)),
    );
}

/// Display identity of a user: the username, or the raw id if the account is gone.
async fn display_name(state: &AppState, user_id: Uuid) -> AppResult<String> {
    let user = state.users.find_by_id(user_id).await?;

    Ok(user.map_or_else(|| user_id.to_string(), |u| u.username))
}
