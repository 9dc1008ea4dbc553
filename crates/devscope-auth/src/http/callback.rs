//! OAuth login redirect and callback.

use axum::extract::{Query, State};
use axum::response::Redirect;
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::error::{AuthError, AuthResult};
use crate::state::AuthState;
use crate::storage::StorageError;
use crate::types::{GitHubIdentity, UserRecord};

/// Query parameters GitHub sends to the callback.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// `GET /auth/github`: issue a login state and redirect to GitHub.
pub async fn login_handler(State(state): State<AuthState>) -> Redirect {
    let login_state = state.sessions.issue_login_state();
    match state.oauth.authorization_url(&login_state) {
        Ok(url) => Redirect::to(url.as_str()),
        Err(e) => {
            state.sessions.consume_login_state(&login_state);
            tracing::error!(error = %e, "Cannot start GitHub login");
            Redirect::to(&state.failure_redirect)
        }
    }
}

/// `GET /auth/github/callback`: finish the login and set the session
/// cookie. Every failure redirects to the failure URL.
pub async fn callback_handler(
    State(state): State<AuthState>,
    Query(params): Query<CallbackParams>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    match complete_login(&state, params).await {
        Ok(user) => {
            let session_id = state.sessions.create(user.id);
            tracing::info!(username = %user.username, user_id = %user.id, "User logged in");
            (
                jar.add(state.cookies.session_cookie(session_id)),
                Redirect::to(&state.success_redirect),
            )
        }
        Err(e) => {
            tracing::warn!(error = %e, "GitHub login failed");
            (jar, Redirect::to(&state.failure_redirect))
        }
    }
}

async fn complete_login(state: &AuthState, params: CallbackParams) -> AuthResult<UserRecord> {
    if let Some(error) = params.error {
        let description = params.error_description.unwrap_or_default();
        return Err(AuthError::ProviderDenied(format!("{error} {description}")));
    }

    let login_state = params.state.ok_or(AuthError::InvalidState)?;
    if !state.sessions.consume_login_state(&login_state) {
        return Err(AuthError::InvalidState);
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AuthError::TokenExchange("missing code".to_string()))?;

    let token = state.oauth.exchange_code(&code).await?;
    let identity = state.oauth.fetch_identity(&token).await?;
    find_or_create_user(state, &identity).await
}

/// Existing record for the GitHub login, or a new one.
pub(crate) async fn find_or_create_user(
    state: &AuthState,
    identity: &GitHubIdentity,
) -> AuthResult<UserRecord> {
    if let Some(user) = state.users.find_by_username(&identity.login).await? {
        return Ok(user);
    }

    let user = UserRecord::from_identity(identity);
    match state.users.save(&user).await {
        Ok(()) => {
            tracing::info!(username = %user.username, "Created user record");
            Ok(user)
        }
        // Lost a race with a concurrent first login.
        Err(StorageError::Conflict(_)) => state
            .users
            .find_by_username(&identity.login)
            .await?
            .ok_or_else(|| AuthError::InvalidIdentity(identity.login.clone())),
        Err(e) => Err(e.into()),
    }
}
