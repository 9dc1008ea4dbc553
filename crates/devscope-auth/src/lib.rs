//! GitHub login, browser sessions and user records for devscope.
//!
//! - [`oauth`]: the GitHub OAuth web flow
//! - [`storage`]: user records and the session table
//! - [`extractors`]: [`CurrentUser`] and [`MaybeUser`]
//! - [`http`]: `/auth/*` routes
//! - [`rate_limit`]: per-IP limiter guarding `/auth/check`

pub mod config;
pub mod error;
pub mod extractors;
pub mod http;
pub mod oauth;
pub mod rate_limit;
pub mod state;
pub mod storage;
pub mod types;

pub use config::{AuthConfig, ConfigError, RateLimitConfig, SessionConfig};
pub use error::{AuthError, AuthResult};
pub use extractors::{CurrentUser, MaybeUser};
pub use http::auth_router;
pub use oauth::GitHubOAuth;
pub use rate_limit::RateLimiter;
pub use state::{AuthState, CookieSettings};
pub use storage::{InMemoryUserStorage, Session, SessionStore, StorageError, UserStorage};
pub use types::{GitHubIdentity, LikedBy, UserRecord};
