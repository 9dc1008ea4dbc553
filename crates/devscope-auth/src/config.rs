//! Authentication configuration.
//!
//! Covers the GitHub OAuth application, where the browser is sent after
//! login, session cookie settings, and the rate limit on session checks.

use devscope_core::MAX_TTL;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Root authentication configuration.
///
/// # Example (TOML)
///
/// ```toml
/// [auth]
/// client_id = "Iv1.0123456789abcdef"
/// callback_url = "http://localhost:5000/api/auth/github/callback"
/// client_base_url = "http://localhost:3000"
///
/// [auth.session]
/// lifetime = "24h"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// OAuth application client id.
    pub client_id: String,

    /// OAuth application client secret.
    pub client_secret: String,

    /// Callback URL registered with the OAuth application.
    pub callback_url: String,

    /// Frontend origin. Successful logins redirect here, failures to
    /// `<client_base_url>/login`.
    pub client_base_url: String,

    /// GitHub authorization endpoint.
    pub authorize_url: String,

    /// GitHub token endpoint.
    pub token_url: String,

    /// Endpoint returning the authenticated GitHub user.
    pub user_url: String,

    /// Requested OAuth scopes, space separated.
    pub scope: String,

    /// How long an issued login `state` stays valid.
    #[serde(with = "humantime_serde")]
    pub login_state_ttl: Duration,

    /// Session settings.
    pub session: SessionConfig,

    /// Rate limit for `/auth/check`.
    pub check_rate_limit: RateLimitConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            callback_url: "http://localhost:5000/api/auth/github/callback".to_string(),
            client_base_url: "http://localhost:3000".to_string(),
            authorize_url: "https://github.com/login/oauth/authorize".to_string(),
            token_url: "https://github.com/login/oauth/access_token".to_string(),
            user_url: "https://api.github.com/user".to_string(),
            scope: "user:email".to_string(),
            login_state_ttl: Duration::from_secs(600),
            session: SessionConfig::default(),
            check_rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Browser session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the session cookie.
    pub cookie_name: String,

    /// Session lifetime; also the cookie `Max-Age`.
    #[serde(with = "humantime_serde")]
    pub lifetime: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "devscope.sid".to_string(),
            lifetime: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Fixed-window rate limit applied per client IP.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests allowed per window.
    pub max_requests: u32,

    /// Window length.
    #[serde(with = "humantime_serde")]
    pub window: Duration,

    /// Key clients by `x-forwarded-for` / `x-real-ip` instead of the socket
    /// peer. Enable only behind a reverse proxy that overwrites them.
    pub trust_proxy_headers: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
            trust_proxy_headers: false,
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// The OAuth client id may be empty; login then fails with a redirect to
    /// the failure URL while the rest of the API keeps working.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("callback_url", &self.callback_url),
            ("client_base_url", &self.client_base_url),
            ("authorize_url", &self.authorize_url),
            ("token_url", &self.token_url),
            ("user_url", &self.user_url),
        ] {
            Url::parse(value)
                .map_err(|e| ConfigError::InvalidValue(format!("auth.{name} '{value}': {e}")))?;
        }

        if self.session.cookie_name.trim().is_empty() {
            return Err(ConfigError::Missing("auth.session.cookie_name".to_string()));
        }
        if self.session.lifetime.is_zero() {
            return Err(ConfigError::InvalidValue(
                "auth.session.lifetime must be > 0".to_string(),
            ));
        }
        if self.login_state_ttl.is_zero() {
            return Err(ConfigError::InvalidValue(
                "auth.login_state_ttl must be > 0".to_string(),
            ));
        }
        for (name, value) in [
            ("session.lifetime", self.session.lifetime),
            ("login_state_ttl", self.login_state_ttl),
            ("check_rate_limit.window", self.check_rate_limit.window),
        ] {
            if value > MAX_TTL {
                return Err(ConfigError::InvalidValue(format!(
                    "auth.{name} must not exceed one year"
                )));
            }
        }
        if self.check_rate_limit.max_requests == 0 || self.check_rate_limit.window.is_zero() {
            return Err(ConfigError::InvalidValue(
                "auth.check_rate_limit values must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Whether an OAuth application has been configured.
    pub fn is_oauth_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }

    /// Redirect target after a successful login.
    pub fn success_redirect(&self) -> String {
        self.client_base_url.trim_end_matches('/').to_string()
    }

    /// Redirect target after a failed login.
    pub fn failure_redirect(&self) -> String {
        format!("{}/login", self.client_base_url.trim_end_matches('/'))
    }
}
