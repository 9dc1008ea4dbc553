//! Axum extractors resolving the session cookie to a user record.
//!
//! - [`CurrentUser`] rejects with `401 {"error": "Unauthorized"}`.
//! - [`MaybeUser`] yields `None` for anonymous requests.
//!
//! Both need [`AuthState`](crate::AuthState) reachable from the router
//! state through `FromRef`.
//!
//! ```ignore
//! use devscope_auth::CurrentUser;
//!
//! async fn handler(CurrentUser(user): CurrentUser) -> String {
//!     format!("Hello, {}!", user.username)
//! }
//! ```

mod session;

pub use session::{CurrentUser, MaybeUser, session_id};
