//! A GitHub user's profile and repositories. Never cached.

use devscope_github::{GitHubApi, GitHubError, RateLimit};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error(transparent)]
    Upstream(#[from] GitHubError),

    #[error("GitHub profile has no repos_url")]
    MissingReposUrl,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileOutcome {
    pub user_profile: Value,
    pub repos: Value,
}

/// Fetch `/users/{username}`, then the profile's `repos_url`.
pub async fn fetch_profile(
    github: &dyn GitHubApi,
    username: &str,
) -> Result<ProfileOutcome, ProfileError> {
    let profile = github.user_profile(username).await?;
    log_rate_limit(username, &profile.rate_limit);

    let repos_url = profile
        .body
        .get("repos_url")
        .and_then(Value::as_str)
        .ok_or(ProfileError::MissingReposUrl)?;
    let repos = github.follow_url(repos_url).await?;

    Ok(ProfileOutcome {
        user_profile: profile.body,
        repos: repos.body,
    })
}

fn log_rate_limit(username: &str, rate_limit: &RateLimit) {
    let resets_at = rate_limit
        .reset_at()
        .and_then(|at| at.format(&Rfc3339).ok())
        .unwrap_or_default();
    tracing::info!(
        username = %username,
        limit = ?rate_limit.limit,
        remaining = ?rate_limit.remaining,
        resets_at = %resets_at,
        "GitHub rate limit"
    );
    if rate_limit.is_exhausted() {
        tracing::warn!(resets_at = %resets_at, "GitHub rate limit exhausted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeGitHub;
    use serde_json::json;

    #[tokio::test]
    async fn returns_profile_and_repos() {
        let github = FakeGitHub::new();
        github.set_profile(
            json!({"login": "octocat", "repos_url": "https://api.github.com/users/octocat/repos"}),
            json!([{"name": "hello-world"}]),
        );

        let outcome = fetch_profile(&github, "octocat").await.unwrap();
        assert_eq!(outcome.user_profile["login"], "octocat");
        assert_eq!(outcome.repos, json!([{"name": "hello-world"}]));
        assert_eq!(github.profile_calls(), 1);
    }

    #[tokio::test]
    async fn missing_repos_url_is_an_error() {
        let github = FakeGitHub::new();
        github.set_profile(json!({"login": "octocat"}), json!([]));

        let err = fetch_profile(&github, "octocat").await.unwrap_err();
        assert!(matches!(err, ProfileError::MissingReposUrl));
    }

    #[tokio::test]
    async fn upstream_failure_propagates() {
        let github = FakeGitHub::new();
        let err = fetch_profile(&github, "ghost").await.unwrap_err();
        assert_eq!(err.to_string(), "GitHub API error: Not Found");
    }

    #[tokio::test]
    async fn every_call_goes_upstream() {
        let github = FakeGitHub::new();
        github.set_profile(
            json!({"repos_url": "https://api.github.com/users/octocat/repos"}),
            json!([]),
        );
        fetch_profile(&github, "octocat").await.unwrap();
        fetch_profile(&github, "octocat").await.unwrap();
        assert_eq!(github.profile_calls(), 2);
    }
}
