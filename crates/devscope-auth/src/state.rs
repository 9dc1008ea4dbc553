//! Shared state for the login routes and session extractors.

use std::sync::Arc;
use std::time::Duration;

use cookie::{Cookie, SameSite};
use devscope_core::MAX_TTL;

use crate::config::AuthConfig;
use crate::error::AuthResult;
use crate::oauth::GitHubOAuth;
use crate::rate_limit::RateLimiter;
use crate::storage::{SessionStore, UserStorage};

/// Session cookie attributes.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: String,
    /// `Secure` plus `SameSite=None` when set; `SameSite=Lax` otherwise.
    pub secure: bool,
    pub max_age: Duration,
}

impl CookieSettings {
    /// Cookie carrying a new session id.
    pub fn session_cookie(&self, session_id: String) -> Cookie<'static> {
        let same_site = if self.secure {
            SameSite::None
        } else {
            SameSite::Lax
        };

        Cookie::build((self.name.clone(), session_id))
            .http_only(true)
            .secure(self.secure)
            .same_site(same_site)
            .path("/")
            .max_age(cookie_max_age(self.max_age))
            .build()
    }

    /// Cookie used to remove the session cookie from the browser.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((self.name.clone(), "")).path("/").build()
    }
}

/// Session lifetime as a cookie `Max-Age`, clamped like the session itself.
fn cookie_max_age(lifetime: Duration) -> time::Duration {
    let secs = lifetime.min(MAX_TTL).as_secs();
    time::Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX))
}

/// State required by the auth routes and the [`CurrentUser`] /
/// [`MaybeUser`] extractors.
///
/// Embed it in the application state and expose it with `FromRef`.
///
/// [`CurrentUser`]: crate::extractors::CurrentUser
/// [`MaybeUser`]: crate::extractors::MaybeUser
#[derive(Clone)]
pub struct AuthState {
    pub oauth: Arc<GitHubOAuth>,
    pub sessions: Arc<SessionStore>,
    pub users: Arc<dyn UserStorage>,
    pub cookies: CookieSettings,
    pub check_limiter: Arc<RateLimiter>,
    pub success_redirect: String,
    pub failure_redirect: String,
}

impl AuthState {
    /// Build the state from configuration.
    ///
    /// `secure_cookies` is set when running in production.
    pub fn from_config(
        config: &AuthConfig,
        users: Arc<dyn UserStorage>,
        user_agent: &str,
        secure_cookies: bool,
    ) -> AuthResult<Self> {
        Ok(Self {
            oauth: Arc::new(GitHubOAuth::new(config, user_agent)?),
            sessions: Arc::new(SessionStore::with_system_clock(
                config.session.lifetime,
                config.login_state_ttl,
            )),
            users,
            cookies: CookieSettings {
                name: config.session.cookie_name.clone(),
                secure: secure_cookies,
                max_age: config.session.lifetime,
            },
            check_limiter: Arc::new(RateLimiter::with_system_clock(&config.check_rate_limit)),
            success_redirect: config.success_redirect(),
            failure_redirect: config.failure_redirect(),
        })
    }

    /// Replace the session store, e.g. with one driven by a manual clock.
    #[must_use]
    pub fn with_sessions(mut self, sessions: Arc<SessionStore>) -> Self {
        self.sessions = sessions;
        self
    }

    /// Replace the `/auth/check` limiter.
    #[must_use]
    pub fn with_check_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.check_limiter = limiter;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(secure: bool) -> CookieSettings {
        CookieSettings {
            name: "devscope.sid".to_string(),
            secure,
            max_age: Duration::from_secs(86_400),
        }
    }

    #[test]
    fn development_cookie_is_lax() {
        let cookie = settings(false).session_cookie("abc".to_string());
        assert_eq!(cookie.name(), "devscope.sid");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(86_400)));
    }

    #[test]
    fn production_cookie_is_secure_cross_site() {
        let cookie = settings(true).session_cookie("abc".to_string());
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::None));
    }

    #[test]
    fn oversized_lifetime_caps_max_age() {
        let cookie = CookieSettings {
            max_age: Duration::MAX,
            ..settings(false)
        }
        .session_cookie("abc".to_string());
        assert_eq!(
            cookie.max_age(),
            Some(time::Duration::seconds(MAX_TTL.as_secs() as i64))
        );
    }
}
