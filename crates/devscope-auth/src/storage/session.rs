//! Browser sessions and pending OAuth logins.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use devscope_core::{Clock, SystemClock, expiry_after};
use rand::RngCore;
use uuid::Uuid;

/// A logged-in browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub expires_at: Instant,
}

/// Process-local session table keyed by an opaque random id.
///
/// Also tracks OAuth `state` values between the login redirect and the
/// callback. Each state is accepted at most once.
#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    pending_logins: DashMap<String, Instant>,
    lifetime: Duration,
    login_state_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    pub fn new(lifetime: Duration, login_state_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: DashMap::new(),
            pending_logins: DashMap::new(),
            lifetime,
            login_state_ttl,
            clock,
        }
    }

    pub fn with_system_clock(lifetime: Duration, login_state_ttl: Duration) -> Self {
        Self::new(lifetime, login_state_ttl, Arc::new(SystemClock))
    }

    /// Start a session for `user_id` and return its id.
    pub fn create(&self, user_id: Uuid) -> String {
        let id = random_token(32);
        let session = Session {
            user_id,
            expires_at: expiry_after(self.clock.now(), self.lifetime),
        };
        self.sessions.insert(id.clone(), session);
        tracing::debug!(user_id = %user_id, "Session created");
        id
    }

    /// The live session for `id`. Expired sessions are removed.
    pub fn resolve(&self, id: &str) -> Option<Session> {
        let now = self.clock.now();
        self.sessions
            .remove_if(id, |_, s| now >= s.expires_at);
        self.sessions.get(id).map(|s| *s)
    }

    /// End a session. Returns whether it existed.
    pub fn destroy(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Issue a fresh OAuth `state` value.
    pub fn issue_login_state(&self) -> String {
        let state = random_token(16);
        self.pending_logins
            .insert(state.clone(), expiry_after(self.clock.now(), self.login_state_ttl));
        state
    }

    /// Consume a `state` value. Returns false if it is unknown, already used
    /// or expired.
    pub fn consume_login_state(&self, state: &str) -> bool {
        let now = self.clock.now();
        self.pending_logins
            .remove(state)
            .is_some_and(|(_, expires_at)| now < expires_at)
    }

    /// Drop expired sessions and login states. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.sessions.len() + self.pending_logins.len();
        self.sessions.retain(|_, s| now < s.expires_at);
        self.pending_logins.retain(|_, expires_at| now < *expires_at);
        before - (self.sessions.len() + self.pending_logins.len())
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }
}

fn random_token(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use devscope_core::ManualClock;

    const HOUR: Duration = Duration::from_secs(3600);
    const MINUTE: Duration = Duration::from_secs(60);

    fn store() -> (SessionStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (SessionStore::new(HOUR, MINUTE, clock.clone()), clock)
    }

    #[test]
    fn session_lifecycle() {
        let (store, _) = store();
        let user_id = Uuid::new_v4();
        let id = store.create(user_id);

        assert_eq!(id.len(), 64);
        assert_eq!(store.resolve(&id).unwrap().user_id, user_id);
        assert!(store.destroy(&id));
        assert!(store.resolve(&id).is_none());
        assert!(!store.destroy(&id));
    }

    #[test]
    fn sessions_expire() {
        let (store, clock) = store();
        let id = store.create(Uuid::new_v4());

        clock.advance(HOUR - Duration::from_secs(1));
        assert!(store.resolve(&id).is_some());

        clock.advance(Duration::from_secs(1));
        assert!(store.resolve(&id).is_none());
        assert_eq!(store.active_sessions(), 0);
    }

    #[test]
    fn session_ids_are_unique() {
        let (store, _) = store();
        let user_id = Uuid::new_v4();
        assert_ne!(store.create(user_id), store.create(user_id));
    }

    #[test]
    fn login_state_is_single_use() {
        let (store, _) = store();
        let state = store.issue_login_state();

        assert!(store.consume_login_state(&state));
        assert!(!store.consume_login_state(&state));
        assert!(!store.consume_login_state("forged"));
    }

    #[test]
    fn login_state_expires() {
        let (store, clock) = store();
        let state = store.issue_login_state();
        clock.advance(MINUTE);
        assert!(!store.consume_login_state(&state));
    }

    #[test]
    fn purge_drops_expired_entries() {
        let (store, clock) = store();
        store.create(Uuid::new_v4());
        store.issue_login_state();

        clock.advance(MINUTE);
        assert_eq!(store.purge_expired(), 1);
        clock.advance(HOUR);
        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.active_sessions(), 0);
    }

    #[test]
    fn oversized_lifetime_is_clamped() {
        let clock = Arc::new(ManualClock::new());
        let store = SessionStore::new(Duration::MAX, Duration::MAX, clock.clone());
        let id = store.create(Uuid::new_v4());
        let state = store.issue_login_state();

        clock.advance(HOUR * 24 * 364);
        assert!(store.resolve(&id).is_some());
        clock.advance(HOUR * 24 * 2);
        assert!(store.resolve(&id).is_none());
        assert!(!store.consume_login_state(&state));
    }
}
