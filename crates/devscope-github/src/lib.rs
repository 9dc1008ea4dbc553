//! GitHub REST API client.
//!
//! [`GitHubApi`] is the seam the request handlers depend on; [`GitHubClient`]
//! is the reqwest-backed implementation.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod types;

pub use client::{GitHubClient, GitHubClientConfig};
pub use endpoints::GitHubApi;
pub use error::{GitHubError, Result};
pub use types::{ApiPayload, RateLimit, RepoSearch};
