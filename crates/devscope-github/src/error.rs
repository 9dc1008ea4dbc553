// Error types for GitHub API access.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GitHubError {
    #[error("GitHub request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("GitHub API error: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid GitHub response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("GitHub response is missing '{0}'")]
    MissingField(&'static str),

    #[error("Invalid GitHub URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid client configuration: {0}")]
    Config(String),
}

impl GitHubError {
    /// HTTP status reported by GitHub, if the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            GitHubError::Api { status, .. } => Some(*status),
            GitHubError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, GitHubError>;
