use axum::extract::{FromRef, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;

use crate::error::AuthError;
use crate::state::AuthState;
use crate::types::UserRecord;

/// The logged-in user, re-read from storage on every request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserRecord);

/// The logged-in user, if any.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<UserRecord>);

/// Session id carried by the request's cookie, if present.
pub fn session_id(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

async fn resolve_user(parts: &Parts, state: &AuthState) -> Result<Option<UserRecord>, AuthError> {
    let Some(id) = session_id(&parts.headers, &state.cookies.name) else {
        return Ok(None);
    };
    let Some(session) = state.sessions.resolve(&id) else {
        tracing::debug!("Unknown or expired session");
        return Ok(None);
    };

    let user = state.users.find_by_id(session.user_id).await?;
    if user.is_none() {
        tracing::warn!(user_id = %session.user_id, "Session refers to a missing user");
    }
    Ok(user)
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        resolve_user(parts, &auth_state)
            .await?
            .map(CurrentUser)
            .ok_or(AuthError::Unauthorized)
    }
}

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        Ok(MaybeUser(resolve_user(parts, &auth_state).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum::http::header::COOKIE;

    #[test]
    fn reads_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; devscope.sid=abc123"),
        );
        assert_eq!(
            session_id(&headers, "devscope.sid").as_deref(),
            Some("abc123")
        );
        assert_eq!(session_id(&headers, "other"), None);
    }

    #[test]
    fn empty_cookie_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("devscope.sid="));
        assert_eq!(session_id(&headers, "devscope.sid"), None);
    }
}
