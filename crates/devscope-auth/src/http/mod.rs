//! HTTP handlers for login, session check and logout.
//!
//! # Available Handlers
//!
//! - [`login_handler`] - redirect to GitHub
//! - [`callback_handler`] - complete the OAuth flow
//! - [`check_handler`] - who is logged in (rate limited)
//! - [`logout_handler`] - end the session

pub mod callback;
pub mod session;

pub use callback::{CallbackParams, callback_handler, login_handler};
pub use session::{check_handler, logout_handler};

use axum::Router;
use axum::extract::FromRef;
use axum::middleware::from_fn_with_state;
use axum::routing::get;

use crate::rate_limit;
use crate::state::AuthState;

/// Routes mounted under `/auth`.
///
/// ```ignore
/// let app = Router::new()
///     .nest("/api/auth", auth_router(&auth_state))
///     .with_state(app_state);
/// ```
pub fn auth_router<S>(state: &AuthState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    AuthState: FromRef<S>,
{
    Router::new()
        .route("/github", get(login_handler))
        .route("/github/callback", get(callback_handler))
        .route(
            "/check",
            get(check_handler).layer(from_fn_with_state(
                state.check_limiter.clone(),
                rate_limit::enforce,
            )),
        )
        .route("/logout", get(logout_handler).post(logout_handler))
}
