//! User records and GitHub identities.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A person who has logged in at least once.
///
/// Serialized in camelCase, which is the shape the frontend consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: Uuid,

    /// GitHub login. Unique across records.
    pub username: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub profile_url: Option<String>,

    #[serde(default)]
    pub avatar_url: Option<String>,

    /// Usernames this user has liked, each at most once.
    #[serde(default)]
    pub liked_profiles: Vec<String>,

    /// Who liked this user.
    #[serde(default)]
    pub liked_by: Vec<LikedBy>,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl UserRecord {
    /// A fresh record for a first login.
    pub fn from_identity(identity: &GitHubIdentity) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: identity.login.clone(),
            name: identity.name.clone(),
            profile_url: identity.html_url.clone(),
            avatar_url: identity.avatar_url.clone(),
            liked_profiles: Vec::new(),
            liked_by: Vec::new(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn has_liked(&self, username: &str) -> bool {
        self.liked_profiles.iter().any(|u| u == username)
    }
}

/// One entry of a user's `likedBy` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedBy {
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub liked_date: OffsetDateTime,
}

/// The subset of GitHub's `/user` response used to build a [`UserRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitHubIdentity {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn identity() -> GitHubIdentity {
        serde_json::from_value(json!({
            "login": "octocat",
            "id": 583231,
            "name": "The Octocat",
            "html_url": "https://github.com/octocat",
            "avatar_url": "https://avatars.githubusercontent.com/u/583231"
        }))
        .unwrap()
    }

    #[test]
    fn record_from_identity() {
        let user = UserRecord::from_identity(&identity());
        assert_eq!(user.username, "octocat");
        assert_eq!(user.name.as_deref(), Some("The Octocat"));
        assert!(user.liked_profiles.is_empty());
        assert!(!user.has_liked("someone"));
    }

    #[test]
    fn serializes_camel_case() {
        let mut user = UserRecord::from_identity(&identity());
        user.liked_by.push(LikedBy {
            username: "hubot".to_string(),
            avatar_url: None,
            liked_date: OffsetDateTime::UNIX_EPOCH,
        });

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["profileUrl"], "https://github.com/octocat");
        assert_eq!(value["likedProfiles"], json!([]));
        assert_eq!(value["likedBy"][0]["username"], "hubot");
        assert_eq!(value["likedBy"][0]["likedDate"], "1970-01-01T00:00:00Z");
        assert!(value.get("createdAt").is_some());
    }
}
