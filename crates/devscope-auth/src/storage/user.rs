//! User storage trait.

use async_trait::async_trait;
use uuid::Uuid;

use crate::types::{LikedBy, UserRecord};

/// Errors raised by a [`UserStorage`] backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    /// Another record already holds this username.
    #[error("Username '{0}' is already taken")]
    Conflict(String),

    /// No record has this id.
    #[error("User '{0}' not found")]
    NotFound(Uuid),

    /// The backend failed.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Persistence for [`UserRecord`]s.
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Find a user by id. Returns `None` if the user doesn't exist.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StorageError>;

    /// Find a user by exact GitHub login.
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StorageError>;

    /// Insert or replace a record by id.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Conflict`] if a different record already uses
    /// the same username.
    async fn save(&self, user: &UserRecord) -> Result<(), StorageError>;

    /// Append `like` to the `likedBy` list of user `target`, unless that list
    /// already holds an entry from the same username.
    ///
    /// The check and the append apply to the stored record as one step.
    /// Returns whether the entry was added.
    async fn add_liked_by(&self, target: Uuid, like: LikedBy) -> Result<bool, StorageError>;

    /// Append `username` to the `likedProfiles` list of user `user`, unless it
    /// is already there.
    ///
    /// The check and the append apply to the stored record as one step.
    /// Returns whether the username was added.
    async fn add_liked_profile(&self, user: Uuid, username: &str) -> Result<bool, StorageError>;
}
