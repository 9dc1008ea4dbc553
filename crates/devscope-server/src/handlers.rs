use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use devscope_api::{ApiError, ApiResponse};
use devscope_auth::CurrentUser;
use devscope_core::{SortKey, sort_repositories};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::OffsetDateTime;

use crate::explore::ExploreError;
use crate::likes::{self, LikeError};
use crate::profile::{self, ProfileError};
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
}

pub async fn root() -> impl IntoResponse {
    let body = json!({
        "service": "devscope",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(body))
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

/// Optional `?sort=stars|forks|recent`.
#[derive(Debug, Default, Deserialize)]
pub struct SortParams {
    pub sort: Option<String>,
}

impl SortParams {
    fn key(&self) -> Result<Option<SortKey>, ApiError> {
        self.sort
            .as_deref()
            .map(str::parse::<SortKey>)
            .transpose()
            .map_err(|e| ApiError::bad_request(e.to_string()))
    }
}

fn apply_sort(repos: &mut Value, key: Option<SortKey>) {
    if let (Some(key), Value::Array(items)) = (key, repos) {
        sort_repositories(items, key);
    }
}

#[derive(Serialize)]
pub struct ExploreResponse {
    pub repos: Value,
    pub cached: bool,
    #[serde(
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<OffsetDateTime>,
}

// GET /api/explore/{language}
pub async fn explore_popular(
    State(state): State<AppState>,
    Path(language): Path<String>,
    Query(params): Query<SortParams>,
) -> Result<ApiResponse<ExploreResponse>, ApiError> {
    let sort = params.key()?;
    let outcome = state.explore.popular(&language).await.map_err(|e| match e {
        ExploreError::Busy => ApiError::service_unavailable(e.to_string()),
        ExploreError::Upstream(ref err) => {
            ApiError::from_error(err, state.expose_error_details)
        }
    })?;

    let mut repos = Value::Array(outcome.repos);
    apply_sort(&mut repos, sort);
    Ok(ApiResponse::ok(ExploreResponse {
        repos,
        cached: outcome.cached,
        timestamp: outcome.cached.then(OffsetDateTime::now_utc),
    }))
}

// GET /api/users/profile/{username}
pub async fn user_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(params): Query<SortParams>,
) -> Result<ApiResponse<Value>, ApiError> {
    let sort = params.key()?;
    let mut outcome = profile::fetch_profile(state.github.as_ref(), &username)
        .await
        .map_err(|e: ProfileError| ApiError::internal(e.to_string()))?;

    apply_sort(&mut outcome.repos, sort);
    Ok(ApiResponse::ok(json!({
        "userProfile": outcome.user_profile,
        "repos": outcome.repos,
    })))
}

// POST /api/users/like/{username}
pub async fn like_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
) -> Result<ApiResponse<Value>, ApiError> {
    likes::like_profile(state.auth.users.as_ref(), &user, &username)
        .await
        .map_err(|e| match e {
            LikeError::NotMember => ApiError::not_found(e.to_string()),
            LikeError::AlreadyLiked | LikeError::SelfLike => ApiError::bad_request(e.to_string()),
            LikeError::Storage(_) => ApiError::internal(e.to_string()),
        })?;

    Ok(ApiResponse::ok(json!({ "message": "User liked" })))
}

// GET /api/users/likes
pub async fn get_likes(CurrentUser(user): CurrentUser) -> ApiResponse<Value> {
    ApiResponse::ok(json!({ "likedBy": user.liked_by }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_param_parsing() {
        let params = SortParams {
            sort: Some("Stars".to_string()),
        };
        assert_eq!(params.key().unwrap(), Some(SortKey::Stars));
        assert_eq!(SortParams::default().key().unwrap(), None);

        let err = SortParams {
            sort: Some("size".to_string()),
        }
        .key()
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn sort_applies_only_to_arrays() {
        let mut repos = json!([
            {"name": "a", "forks_count": 1},
            {"name": "b", "forks_count": 5}
        ]);
        apply_sort(&mut repos, Some(SortKey::Forks));
        assert_eq!(repos[0]["name"], "b");

        let mut not_a_list = json!({"message": "Not Found"});
        apply_sort(&mut not_a_list, Some(SortKey::Forks));
        assert_eq!(not_a_list, json!({"message": "Not Found"}));
    }

    #[test]
    fn explore_response_timestamp_only_when_cached() {
        let fresh = serde_json::to_value(ExploreResponse {
            repos: json!([]),
            cached: false,
            timestamp: None,
        })
        .unwrap();
        assert_eq!(fresh, json!({"repos": [], "cached": false}));

        let cached = serde_json::to_value(ExploreResponse {
            repos: json!([]),
            cached: true,
            timestamp: Some(OffsetDateTime::UNIX_EPOCH),
        })
        .unwrap();
        assert_eq!(cached["timestamp"], "1970-01-01T00:00:00Z");
    }
}
