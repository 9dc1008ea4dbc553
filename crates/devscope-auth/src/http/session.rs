//! Session introspection and logout.

use axum::Json;
use axum::extract::State;
use axum_extra::extract::CookieJar;
use serde_json::{Value, json};

use crate::extractors::MaybeUser;
use crate::state::AuthState;

/// `GET /auth/check`: `{"user": <record> | null}`.
pub async fn check_handler(MaybeUser(user): MaybeUser) -> Json<Value> {
    Json(json!({ "user": user }))
}

/// `GET /auth/logout`: destroy the session and clear its cookie.
pub async fn logout_handler(
    State(state): State<AuthState>,
    jar: CookieJar,
) -> (CookieJar, Json<Value>) {
    let jar = match jar.get(&state.cookies.name).map(|c| c.value().to_string()) {
        Some(id) => {
            if state.sessions.destroy(&id) {
                tracing::info!("User logged out");
            }
            jar.remove(state.cookies.removal_cookie())
        }
        None => jar,
    };
    (jar, Json(json!({ "message": "Logged out" })))
}
