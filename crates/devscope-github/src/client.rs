// GitHub API HTTP client.
// Handles authentication, URL construction, and response status checks.

use reqwest::{
    Client, Response,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT},
};
use serde_json::Value;
use url::Url;

use crate::error::{GitHubError, Result};
use crate::types::{ApiPayload, RateLimit};

pub const GITHUB_API_BASE: &str = "https://api.github.com";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Settings for [`GitHubClient`].
#[derive(Debug, Clone)]
pub struct GitHubClientConfig {
    /// Base URL of the REST API.
    pub api_base_url: String,
    /// Personal access token. Requests are anonymous without one.
    pub token: Option<String>,
    pub user_agent: String,
}

impl Default for GitHubClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: GITHUB_API_BASE.to_string(),
            token: None,
            user_agent: concat!("devscope/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// GitHub API client with token authentication.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    base_url: Url,
}

impl GitHubClient {
    pub fn new(config: &GitHubClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.api_base_url)
            .map_err(|e| GitHubError::Config(format!("api_base_url: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(GitHubError::Config(format!(
                "api_base_url is not a base URL: {base_url}"
            )));
        }

        let mut headers = HeaderMap::new();
        match config.token.as_deref().filter(|t| !t.is_empty()) {
            Some(token) => {
                let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                    .map_err(|e| GitHubError::Config(format!("token: {e}")))?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            None => tracing::warn!("No GitHub token configured, using anonymous rate limits"),
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| GitHubError::Config(format!("user_agent: {e}")))?,
        );

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self { client, base_url })
    }

    /// Build `<base>/<segments...>`, percent-encoding each segment.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GitHubError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET a URL and decode its JSON body.
    ///
    /// Only URLs under the configured API base are followed, so the token is
    /// never sent elsewhere.
    pub(crate) async fn get_json(&self, url: Url, query: &[(&str, String)]) -> Result<ApiPayload> {
        let same_origin = url.origin() == self.base_url.origin();
        if !same_origin || !url.path().starts_with(self.base_url.path().trim_end_matches('/')) {
            return Err(GitHubError::InvalidUrl(format!(
                "{url} is outside {}",
                self.base_url
            )));
        }

        tracing::debug!(url = %url, "GitHub request");
        let response = self.client.get(url).query(query).send().await?;
        let rate_limit = RateLimit::from_headers(response.headers());
        let response = check_response(response).await?;
        let body: Value = serde_json::from_slice(&response.bytes().await?)?;

        Ok(ApiPayload { body, rate_limit })
    }
}

/// Turn non-success statuses into [`GitHubError::Api`], using GitHub's
/// `message` field when present and the status reason otherwise.
async fn check_response(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown status")
                .to_string()
        });

    tracing::warn!(status = %status.as_u16(), message = %message, "GitHub returned an error");
    Err(GitHubError::Api {
        status: status.as_u16(),
        message,
    })
}
