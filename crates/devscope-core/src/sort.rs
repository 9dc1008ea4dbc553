//! Ordering of repository lists returned by GitHub.
//!
//! Repositories are passed through as raw JSON; sorting only reads the
//! `stargazers_count`, `forks_count` and `created_at` fields.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Field to sort repositories by, always descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Newest `created_at` first.
    Recent,
    /// Most `stargazers_count` first.
    Stars,
    /// Most `forks_count` first.
    Forks,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Recent => "recent",
            SortKey::Stars => "stars",
            SortKey::Forks => "forks",
        }
    }

    fn extract(&self, repo: &Value) -> Option<i128> {
        match self {
            SortKey::Stars => repo.get("stargazers_count")?.as_i64().map(i128::from),
            SortKey::Forks => repo.get("forks_count")?.as_i64().map(i128::from),
            SortKey::Recent => {
                let raw = repo.get("created_at")?.as_str()?;
                OffsetDateTime::parse(raw, &Rfc3339)
                    .ok()
                    .map(|dt| dt.unix_timestamp_nanos())
            }
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort key '{0}', expected one of: recent, stars, forks")]
pub struct SortKeyError(pub String);

impl FromStr for SortKey {
    type Err = SortKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "recent" => Ok(SortKey::Recent),
            "stars" => Ok(SortKey::Stars),
            "forks" => Ok(SortKey::Forks),
            _ => Err(SortKeyError(s.to_string())),
        }
    }
}

/// Sort repositories in place, descending by `key`.
///
/// The sort is stable: ties keep their original relative order. Entries
/// missing the field (or with an unparsable date) go last.
pub fn sort_repositories(repos: &mut [Value], key: SortKey) {
    repos.sort_by(|a, b| match (key.extract(a), key.extract(b)) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
