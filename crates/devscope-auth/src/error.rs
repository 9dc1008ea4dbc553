//! Authentication error types.

use axum::response::{IntoResponse, Response};
use devscope_api::ApiError;

use crate::storage::StorageError;

/// Errors raised while logging in or resolving the current user.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The request carries no valid session.
    #[error("Unauthorized")]
    Unauthorized,

    /// The OAuth application credentials are not configured.
    #[error("GitHub OAuth is not configured")]
    NotConfigured,

    /// The `state` parameter is missing, unknown or expired.
    #[error("Invalid or expired login state")]
    InvalidState,

    /// GitHub redirected back with an `error` parameter.
    #[error("Authorization denied by provider: {0}")]
    ProviderDenied(String),

    /// The token endpoint rejected the code.
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    /// The identity returned by GitHub could not be used.
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthorized => ApiError::unauthorized("Unauthorized"),
            other => ApiError::internal(other.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
