//! In-memory user storage.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use super::user::{StorageError, UserStorage};
use crate::types::{LikedBy, UserRecord};

/// [`UserStorage`] backed by two concurrent maps: records by id and a
/// username index.
#[derive(Debug, Default)]
pub struct InMemoryUserStorage {
    users: DashMap<Uuid, UserRecord>,
    by_username: DashMap<String, Uuid>,
}

impl InMemoryUserStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserStorage for InMemoryUserStorage {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StorageError> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StorageError> {
        let Some(id) = self.by_username.get(username).map(|id| *id) else {
            return Ok(None);
        };
        self.find_by_id(id).await
    }

    async fn save(&self, user: &UserRecord) -> Result<(), StorageError> {
        match self.by_username.entry(user.username.clone()) {
            Entry::Occupied(entry) if *entry.get() != user.id => {
                return Err(StorageError::Conflict(user.username.clone()));
            }
            Entry::Occupied(_) => {}
            Entry::Vacant(entry) => {
                entry.insert(user.id);
            }
        }

        // A rename frees the previous username.
        if let Some(previous) = self.users.insert(user.id, user.clone())
            && previous.username != user.username
        {
            self.by_username
                .remove_if(&previous.username, |_, id| *id == user.id);
        }
        Ok(())
    }

    async fn add_liked_by(&self, target: Uuid, like: LikedBy) -> Result<bool, StorageError> {
        let mut user = self
            .users
            .get_mut(&target)
            .ok_or(StorageError::NotFound(target))?;
        if user.liked_by.iter().any(|l| l.username == like.username) {
            return Ok(false);
        }
        user.liked_by.push(like);
        Ok(true)
    }

    async fn add_liked_profile(&self, user: Uuid, username: &str) -> Result<bool, StorageError> {
        let mut record = self
            .users
            .get_mut(&user)
            .ok_or(StorageError::NotFound(user))?;
        if record.has_liked(username) {
            return Ok(false);
        }
        record.liked_profiles.push(username.to_string());
        Ok(true)
    }
}
