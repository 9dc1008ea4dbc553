// GitHub API endpoint functions.
// Provides the typed operations the request handlers rely on.

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::client::GitHubClient;
use crate::error::{GitHubError, Result};
use crate::types::{ApiPayload, RepoSearch};

/// Upstream operations used by the request handlers.
///
/// Implemented by [`GitHubClient`]; tests substitute fakes to count calls.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// Repositories matching `search`, most stars first. A response without
    /// `items` yields an empty list.
    async fn search_repositories(&self, search: &RepoSearch) -> Result<Vec<Value>>;

    /// `GET /users/{username}`.
    async fn user_profile(&self, username: &str) -> Result<ApiPayload>;

    /// GET an absolute API URL taken from a previous response, such as a
    /// profile's `repos_url`.
    async fn follow_url(&self, url: &str) -> Result<ApiPayload>;
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn search_repositories(&self, search: &RepoSearch) -> Result<Vec<Value>> {
        let url = self.endpoint(&["search", "repositories"])?;
        let payload = self.get_json(url, &search.query_pairs()).await?;

        let items = match payload.body.get("items") {
            Some(Value::Array(items)) => items.clone(),
            Some(_) => return Err(GitHubError::MissingField("items")),
            None => Vec::new(),
        };

        tracing::debug!(
            language = %search.language,
            count = items.len(),
            remaining = ?payload.rate_limit.remaining,
            "Repository search completed"
        );
        Ok(items)
    }

    async fn user_profile(&self, username: &str) -> Result<ApiPayload> {
        let url = self.endpoint(&["users", username])?;
        self.get_json(url, &[]).await
    }

    async fn follow_url(&self, url: &str) -> Result<ApiPayload> {
        let url = Url::parse(url).map_err(|e| GitHubError::InvalidUrl(format!("{url}: {e}")))?;
        self.get_json(url, &[]).await
    }
}
