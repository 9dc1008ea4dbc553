//! Liking another member's profile.

use devscope_auth::{LikedBy, StorageError, UserRecord, UserStorage};
use time::OffsetDateTime;

#[derive(Debug, thiserror::Error)]
pub enum LikeError {
    #[error("User is not a member")]
    NotMember,

    #[error("User already liked")]
    AlreadyLiked,

    #[error("You cannot like your own profile")]
    SelfLike,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Record that `caller` likes `target_username`.
///
/// Both lists are appended concurrently, each as a single store operation
/// that skips duplicates. There is no transaction: if one append fails the
/// other may still have been applied.
pub async fn like_profile(
    users: &dyn UserStorage,
    caller: &UserRecord,
    target_username: &str,
) -> Result<(), LikeError> {
    let target = users
        .find_by_username(target_username)
        .await?
        .ok_or(LikeError::NotMember)?;

    if target.id == caller.id {
        return Err(LikeError::SelfLike);
    }

    let like = LikedBy {
        username: caller.username.clone(),
        avatar_url: caller.avatar_url.clone(),
        liked_date: OffsetDateTime::now_utc(),
    };
    let (_, profile_added) = tokio::try_join!(
        users.add_liked_by(target.id, like),
        users.add_liked_profile(caller.id, &target.username),
    )?;
    if !profile_added {
        return Err(LikeError::AlreadyLiked);
    }

    tracing::info!(from = %caller.username, to = %target.username, "Profile liked");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use devscope_auth::{GitHubIdentity, InMemoryUserStorage};
    use uuid::Uuid;

    fn record(login: &str) -> UserRecord {
        UserRecord::from_identity(&GitHubIdentity {
            login: login.to_string(),
            name: None,
            html_url: None,
            avatar_url: Some(format!("https://avatars.example/{login}")),
        })
    }

    async fn storage_with(users: &[&UserRecord]) -> InMemoryUserStorage {
        let storage = InMemoryUserStorage::new();
        for user in users {
            storage.save(user).await.unwrap();
        }
        storage
    }

    #[tokio::test]
    async fn like_updates_both_records() {
        let alice = record("alice");
        let bob = record("bob");
        let storage = storage_with(&[&alice, &bob]).await;

        like_profile(&storage, &alice, "bob").await.unwrap();

        let alice = storage.find_by_id(alice.id).await.unwrap().unwrap();
        let bob = storage.find_by_id(bob.id).await.unwrap().unwrap();
        assert_eq!(alice.liked_profiles, vec!["bob".to_string()]);
        assert_eq!(bob.liked_by.len(), 1);
        assert_eq!(bob.liked_by[0].username, "alice");
        assert_eq!(
            bob.liked_by[0].avatar_url.as_deref(),
            Some("https://avatars.example/alice")
        );
    }

    #[tokio::test]
    async fn second_like_conflicts() {
        let alice = record("alice");
        let bob = record("bob");
        let storage = storage_with(&[&alice, &bob]).await;

        like_profile(&storage, &alice, "bob").await.unwrap();
        let caller = storage.find_by_id(alice.id).await.unwrap().unwrap();
        let err = like_profile(&storage, &caller, "bob").await.unwrap_err();
        assert!(matches!(err, LikeError::AlreadyLiked));

        let alice = storage.find_by_id(alice.id).await.unwrap().unwrap();
        let bob = storage.find_by_id(bob.id).await.unwrap().unwrap();
        assert_eq!(alice.liked_profiles, vec!["bob".to_string()]);
        assert_eq!(bob.liked_by.len(), 1);
    }

    #[tokio::test]
    async fn unknown_target_changes_nothing() {
        let alice = record("alice");
        let storage = storage_with(&[&alice]).await;

        let err = like_profile(&storage, &alice, "nobody")
            .await
            .unwrap_err();
        assert!(matches!(err, LikeError::NotMember));
        assert_eq!(storage.find_by_id(alice.id).await.unwrap(), Some(alice));
    }

    #[tokio::test]
    async fn self_like_is_rejected() {
        let alice = record("alice");
        let storage = storage_with(&[&alice]).await;
        let err = like_profile(&storage, &alice, "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, LikeError::SelfLike));
    }

    /// Delegates to [`InMemoryUserStorage`], failing the list appends of one
    /// user and yielding to the scheduler before every call.
    struct SlowStore {
        inner: InMemoryUserStorage,
        fail_for: Option<Uuid>,
    }

    impl SlowStore {
        fn new(inner: InMemoryUserStorage) -> Self {
            Self {
                inner,
                fail_for: None,
            }
        }

        fn check(&self, id: Uuid) -> Result<(), StorageError> {
            if self.fail_for == Some(id) {
                return Err(StorageError::Backend("write failed".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl UserStorage for SlowStore {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StorageError> {
            tokio::task::yield_now().await;
            self.inner.find_by_id(id).await
        }
        async fn find_by_username(
            &self,
            username: &str,
        ) -> Result<Option<UserRecord>, StorageError> {
            tokio::task::yield_now().await;
            self.inner.find_by_username(username).await
        }
        async fn save(&self, user: &UserRecord) -> Result<(), StorageError> {
            tokio::task::yield_now().await;
            self.inner.save(user).await
        }
        async fn add_liked_by(&self, target: Uuid, like: LikedBy) -> Result<bool, StorageError> {
            tokio::task::yield_now().await;
            self.check(target)?;
            self.inner.add_liked_by(target, like).await
        }
        async fn add_liked_profile(
            &self,
            user: Uuid,
            username: &str,
        ) -> Result<bool, StorageError> {
            tokio::task::yield_now().await;
            self.check(user)?;
            self.inner.add_liked_profile(user, username).await
        }
    }

    #[tokio::test]
    async fn partial_failure_is_reported_without_rollback() {
        let alice = record("alice");
        let bob = record("bob");
        let storage = SlowStore {
            inner: storage_with(&[&alice, &bob]).await,
            fail_for: Some(alice.id),
        };

        let err = like_profile(&storage, &alice, "bob")
            .await
            .unwrap_err();
        assert!(matches!(err, LikeError::Storage(_)));

        let bob = storage.find_by_id(bob.id).await.unwrap().unwrap();
        let alice = storage.find_by_id(alice.id).await.unwrap().unwrap();
        assert_eq!(bob.liked_by.len(), 1);
        assert!(alice.liked_profiles.is_empty());
    }

    #[tokio::test]
    async fn concurrent_likes_of_one_target_are_all_kept() {
        let alice = record("alice");
        let carol = record("carol");
        let bob = record("bob");
        let storage = SlowStore::new(storage_with(&[&alice, &carol, &bob]).await);

        let (first, second) = tokio::join!(
            like_profile(&storage, &alice, "bob"),
            like_profile(&storage, &carol, "bob"),
        );
        first.unwrap();
        second.unwrap();

        let bob = storage.find_by_id(bob.id).await.unwrap().unwrap();
        let mut likers: Vec<_> = bob.liked_by.iter().map(|l| l.username.as_str()).collect();
        likers.sort_unstable();
        assert_eq!(likers, vec!["alice", "carol"]);
    }

    #[tokio::test]
    async fn concurrent_likes_by_one_caller_are_all_kept() {
        let alice = record("alice");
        let bob = record("bob");
        let carol = record("carol");
        let storage = SlowStore::new(storage_with(&[&alice, &bob, &carol]).await);

        let (first, second) = tokio::join!(
            like_profile(&storage, &alice, "bob"),
            like_profile(&storage, &alice, "carol"),
        );
        first.unwrap();
        second.unwrap();

        let mut alice = storage.find_by_id(alice.id).await.unwrap().unwrap();
        alice.liked_profiles.sort_unstable();
        assert_eq!(alice.liked_profiles, vec!["bob".to_string(), "carol".to_string()]);
    }

    #[tokio::test]
    async fn racing_duplicate_likes_apply_once() {
        let alice = record("alice");
        let bob = record("bob");
        let storage = SlowStore::new(storage_with(&[&alice, &bob]).await);

        let (first, second) = tokio::join!(
            like_profile(&storage, &alice, "bob"),
            like_profile(&storage, &alice, "bob"),
        );
        let results = [first, second];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            results
                .iter()
                .any(|r| matches!(r, Err(LikeError::AlreadyLiked)))
        );

        let alice = storage.find_by_id(alice.id).await.unwrap().unwrap();
        let bob = storage.find_by_id(bob.id).await.unwrap().unwrap();
        assert_eq!(alice.liked_profiles, vec!["bob".to_string()]);
        assert_eq!(bob.liked_by.len(), 1);
    }
}
