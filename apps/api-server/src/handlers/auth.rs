//! Token issuance handlers.

use actix_web::{HttpResponse, web};

use blog_core::RepoError;
use blog_core::ports::AuthError;
use blog_core::domain::{NewUser, User};
use blog_shared::dto::{AuthResponse, LoginRequest, RegisterUserRequest, UserResponse};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;

fn issue_token(state: &AppState, user: &User) -> AppResult<AuthResponse> {
    let access_token = state
        .tokens
        .generate_token(user.id, &user.username)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(AuthResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.expiration_seconds().max(0) as u64,
    })
}

/// POST /auth/register/
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let username = req.username.trim().to_string();

    if username.is_empty() {
        return Err(AppError::BadRequest("Username may not be blank".to_string()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    if state.users.find_by_username(&username).await?.is_some() {
        return Err(AppError::Conflict("Username already registered".to_string()));
    }

    let password_hash = state.passwords.hash(&req.password)?;

    let user = state
        .users
        .create(NewUser::new(username, password_hash))
        .await
        .map_err(|e| match e {
            RepoError::Duplicate(_) => AppError::Conflict("Username already registered".to_string()),
            other => other.into(),
        })?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok(HttpResponse::Created().json(issue_token(&state, &user)?))
}

/// POST /auth/login/
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .users
        .find_by_username(req.username.trim())
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !state.passwords.verify(&req.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Password mismatch");
        return Err(AuthError::InvalidCredentials.into());
    }

    Ok(HttpResponse::Ok().json(issue_token(&state, &user)?))
}

/// GET /auth/me/
pub async fn me(identity: Identity) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(UserResponse {
        id: identity.user_id,
        username: identity.username,
    }))
}
