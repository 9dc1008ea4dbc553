//! Most-starred repositories per language, cached in process.
//!
//! A miss takes the refresh lock for the key before calling GitHub.
//! Requests that arrive while the lock is held get [`ExploreError::Busy`]
//! instead of a second upstream call.

use std::sync::Arc;

use devscope_core::TtlCache;
use devscope_github::{GitHubApi, GitHubError, RepoSearch};
use serde_json::Value;

use crate::config::ExploreSettings;

#[derive(Debug, thiserror::Error)]
pub enum ExploreError {
    /// Another request is refreshing this language.
    #[error("Resource is being refreshed, please try again shortly")]
    Busy,

    #[error(transparent)]
    Upstream(#[from] GitHubError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExploreOutcome {
    pub repos: Vec<Value>,
    /// Served from the cache without calling GitHub.
    pub cached: bool,
}

pub fn cache_key(language: &str) -> String {
    format!("popular_{language}")
}

pub struct ExploreService {
    cache: Arc<TtlCache>,
    github: Arc<dyn GitHubApi>,
    settings: ExploreSettings,
}

impl ExploreService {
    pub fn new(cache: Arc<TtlCache>, github: Arc<dyn GitHubApi>, settings: ExploreSettings) -> Self {
        Self {
            cache,
            github,
            settings,
        }
    }

    pub fn cache(&self) -> &TtlCache {
        &self.cache
    }

    pub async fn popular(&self, language: &str) -> Result<ExploreOutcome, ExploreError> {
        let key = cache_key(language);

        if let Some(Value::Array(repos)) = self.cache.get(&key) {
            tracing::debug!(key = %key, count = repos.len(), "cache hit");
            return Ok(ExploreOutcome {
                repos,
                cached: true,
            });
        }

        let Some(_lock) = self.cache.try_lock(&key, self.settings.lock_ttl) else {
            tracing::info!(key = %key, "refresh in progress, rejecting request");
            return Err(ExploreError::Busy);
        };
        tracing::debug!(key = %key, "cache miss");

        let search = RepoSearch::popular(language, self.settings.per_page);
        let repos = self.github.search_repositories(&search).await?;

        let ttl = if repos.is_empty() {
            self.settings.empty_ttl
        } else {
            self.settings.results_ttl
        };
        self.cache.put(&key, Value::Array(repos.clone()), ttl);
        tracing::info!(
            key = %key,
            count = repos.len(),
            ttl_secs = ttl.as_secs(),
            "popular repositories cached"
        );

        Ok(ExploreOutcome {
            repos,
            cached: false,
        })
    }
}
