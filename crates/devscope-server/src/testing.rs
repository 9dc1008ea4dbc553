// Test doubles shared by the service tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use devscope_github::{ApiPayload, GitHubApi, GitHubError, RateLimit, RepoSearch};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;

/// Scripted [`GitHubApi`] that counts calls.
///
/// Search responses are consumed in order; when a gate is set, searches
/// wait on it so tests can hold a refresh in flight.
#[derive(Default)]
pub struct FakeGitHub {
    searches: Mutex<VecDeque<Result<Vec<Value>, GitHubError>>>,
    search_calls: AtomicUsize,
    profile: Mutex<Option<Value>>,
    repos: Mutex<Option<Value>>,
    profile_calls: AtomicUsize,
    gate: Mutex<Option<std::sync::Arc<Notify>>>,
}

impl FakeGitHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_search(&self, result: Result<Vec<Value>, GitHubError>) {
        self.searches.lock().push_back(result);
    }

    pub fn set_profile(&self, profile: Value, repos: Value) {
        *self.profile.lock() = Some(profile);
        *self.repos.lock() = Some(repos);
    }

    pub fn gate_searches(&self, gate: std::sync::Arc<Notify>) {
        *self.gate.lock() = Some(gate);
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }
}

fn api_error(status: u16, message: &str) -> GitHubError {
    GitHubError::Api {
        status,
        message: message.to_string(),
    }
}

#[async_trait]
impl GitHubApi for FakeGitHub {
    async fn search_repositories(&self, _search: &RepoSearch) -> Result<Vec<Value>, GitHubError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.searches
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(api_error(500, "no scripted response")))
    }

    async fn user_profile(&self, _username: &str) -> Result<ApiPayload, GitHubError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        let body = self
            .profile
            .lock()
            .clone()
            .ok_or_else(|| api_error(404, "Not Found"))?;
        Ok(ApiPayload {
            body,
            rate_limit: RateLimit {
                limit: Some(5000),
                remaining: Some(4999),
                reset: Some(1_700_000_000),
            },
        })
    }

    async fn follow_url(&self, _url: &str) -> Result<ApiPayload, GitHubError> {
        let body = self
            .repos
            .lock()
            .clone()
            .ok_or_else(|| api_error(404, "Not Found"))?;
        Ok(ApiPayload {
            body,
            rate_limit: RateLimit::default(),
        })
    }
}
