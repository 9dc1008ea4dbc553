// Types shared by the GitHub client and its callers.

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

/// Rate limit quota reported in GitHub response headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    /// `x-ratelimit-limit`
    pub limit: Option<u64>,
    /// `x-ratelimit-remaining`
    pub remaining: Option<u64>,
    /// `x-ratelimit-reset`, seconds since the Unix epoch
    pub reset: Option<i64>,
}

impl RateLimit {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        fn parse<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
        }

        Self {
            limit: parse(headers, "x-ratelimit-limit"),
            remaining: parse(headers, "x-ratelimit-remaining"),
            reset: parse(headers, "x-ratelimit-reset"),
        }
    }

    /// Reset time as a UTC timestamp.
    pub fn reset_at(&self) -> Option<OffsetDateTime> {
        self.reset
            .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }
}

/// A decoded JSON response together with the rate limit it reported.
#[derive(Debug, Clone)]
pub struct ApiPayload {
    pub body: Value,
    pub rate_limit: RateLimit,
}

/// Repository search for the most-starred repositories in a language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSearch {
    pub language: String,
    pub per_page: u32,
}

impl RepoSearch {
    pub fn popular(language: impl Into<String>, per_page: u32) -> Self {
        Self {
            language: language.into(),
            per_page,
        }
    }

    /// Query string pairs for `/search/repositories`.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("q", format!("language:{}", self.language)),
            ("sort", "stars".to_string()),
            ("order", "desc".to_string()),
            ("per_page", self.per_page.to_string()),
        ]
    }
}
