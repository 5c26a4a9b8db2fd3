//! Bearer token authentication extractor.

use actix_web::{
    FromRequest, HttpRequest, HttpResponse, ResponseError, dev::Payload, http::StatusCode,
    http::header, web,
};
use futures::future::LocalBoxFuture;
use uuid::Uuid;

use blog_core::RepoError;
use blog_core::domain::User;
use blog_core::ports::AuthError;
use blog_shared::ErrorResponse;

use crate::state::AppState;

/// Authenticated caller, resolved from the `Authorization: Bearer` header.
///
/// Every blog route takes this as an argument, which makes authentication
/// mandatory before the handler body runs:
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.username)
/// }
/// ```
/// A valid signature is not enough: the token's subject must still be a
/// stored user.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
}

impl From<User> for Identity {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            username: user.username,
        }
    }
}

/// Why a request could not be authenticated.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error(transparent)]
    Rejected(#[from] AuthError),

    /// The user lookup itself failed; the token may well be valid.
    #[error("user lookup failed: {0}")]
    Lookup(#[from] RepoError),
}

impl ResponseError for AuthenticationError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Rejected(_) => StatusCode::UNAUTHORIZED,
            Self::Lookup(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            Self::Rejected(AuthError::TokenExpired) => {
                ErrorResponse::unauthorized().with_detail("Token has expired. Log in again.")
            }
            Self::Rejected(AuthError::InvalidToken(msg)) => {
                ErrorResponse::unauthorized().with_detail(msg.clone())
            }
            Self::Rejected(_) => ErrorResponse::unauthorized(),
            Self::Lookup(e) => {
                tracing::error!(error = %e, "Could not resolve token subject");
                ErrorResponse::internal_error()
            }
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

fn bearer_token(req: &HttpRequest) -> Result<&str, AuthError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?;

    let value = value
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))
}

async fn authenticate(req: &HttpRequest) -> Result<Identity, AuthenticationError> {
    let state = req.app_data::<web::Data<AppState>>().ok_or_else(|| {
        tracing::error!("AppState not found in app data");
        AuthError::InvalidToken("Server configuration error".to_string())
    })?;

    let claims = state.tokens.validate_token(bearer_token(req)?)?;

    let user = state
        .users
        .find_by_id(claims.user_id)
        .await?
        .ok_or_else(|| AuthError::InvalidToken("Token subject no longer exists".to_string()))?;

    Ok(Identity::from(user))
}

impl FromRequest for Identity {
    type Error = AuthenticationError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            authenticate(&req).await.inspect_err(|e| {
                tracing::debug!(error = %e, path = req.path(), "Rejected unauthenticated request");
            })
        })
    }
}
