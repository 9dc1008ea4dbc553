//! TTL key/value store with lock entries.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::Value;

use super::clock::{Clock, SystemClock, expiry_after};

const LOCK_SUFFIX: &str = "_lock";

/// Key of the lock entry guarding refreshes of `key`.
pub fn lock_key(key: &str) -> String {
    format!("{key}{LOCK_SUFFIX}")
}

/// A cached value with its expiry.
#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub value: Value,
    pub expires_at: Instant,
    /// Set on lock entries: the token of the guard that placed it.
    owner: Option<u64>,
}

impl CacheEntry {
    pub fn new(value: Value, expires_at: Instant) -> Self {
        Self {
            value,
            expires_at,
            owner: None,
        }
    }

    /// An entry is visible strictly before its expiry instant.
    pub fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Process-local cache with per-entry expiry.
///
/// Expired entries are treated as absent and evicted lazily on read or by
/// [`TtlCache::purge_expired`]. Writes are last-writer-wins.
#[derive(Debug)]
pub struct TtlCache {
    entries: DashMap<String, CacheEntry>,
    clock: Arc<dyn Clock>,
    next_lock_token: AtomicU64,
}

impl TtlCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            next_lock_token: AtomicU64::new(1),
        }
    }

    /// Cache driven by the system clock.
    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// Get a live value.
    pub fn get(&self, key: &str) -> Option<Value> {
        let now = self.clock.now();
        let expired = match self.entries.get(key) {
            Some(entry) if entry.is_live(now) => {
                tracing::debug!(key = %key, "cache hit");
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            // Only remove if nobody replaced it in the meantime
            self.entries.remove_if(key, |_, entry| !entry.is_live(now));
            tracing::debug!(key = %key, "cache entry expired");
        } else {
            tracing::debug!(key = %key, "cache miss");
        }
        None
    }

    /// Store `value` under `key` until `now + ttl`, replacing any previous entry.
    ///
    /// `ttl` is clamped to [`MAX_TTL`](super::clock::MAX_TTL).
    pub fn put(&self, key: &str, value: Value, ttl: Duration) {
        let expires_at = expiry_after(self.clock.now(), ttl);
        self.entries
            .insert(key.to_string(), CacheEntry::new(value, expires_at));
        tracing::debug!(key = %key, ttl_ms = %ttl.as_millis(), "cache set");
    }

    /// Remove an entry unconditionally.
    pub fn delete(&self, key: &str) {
        self.entries.remove(key);
        tracing::debug!(key = %key, "cache entry deleted");
    }

    /// Whether a live lock entry exists for `key`.
    pub fn is_locked(&self, key: &str) -> bool {
        self.get(&lock_key(key)).is_some()
    }

    /// Place the lock entry for `key` unless a live one already exists.
    ///
    /// The lock entry expires after `ttl` even if the guard is leaked. Dropping
    /// the returned guard deletes the lock entry, unless it expired and another
    /// caller has placed a new one since.
    pub fn try_lock(&self, key: &str, ttl: Duration) -> Option<CacheLock<'_>> {
        let lock_key = lock_key(key);
        let now = self.clock.now();
        let token = self.next_lock_token.fetch_add(1, Ordering::Relaxed);
        let sentinel = CacheEntry {
            owner: Some(token),
            ..CacheEntry::new(Value::Bool(true), expiry_after(now, ttl))
        };

        match self.entries.entry(lock_key.clone()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_live(now) {
                    tracing::debug!(key = %key, "refresh already in flight");
                    return None;
                }
                occupied.insert(sentinel);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(sentinel);
            }
        }

        tracing::debug!(key = %key, ttl_ms = %ttl.as_millis(), "refresh lock acquired");
        Some(CacheLock {
            cache: self,
            key: lock_key,
            token,
        })
    }

    /// Drop every expired entry and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before.saturating_sub(self.entries.len())
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let mut stats = CacheStats::default();
        for entry in self.entries.iter() {
            if !entry.is_live(now) {
                stats.expired += 1;
            } else if entry.key().ends_with(LOCK_SUFFIX) {
                stats.locks += 1;
            } else {
                stats.live += 1;
            }
        }
        stats
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub live: usize,
    pub locks: usize,
    pub expired: usize,
}

/// Guard for a held refresh lock. Releases the lock when dropped.
#[must_use = "the lock is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct CacheLock<'a> {
    cache: &'a TtlCache,
    key: String,
    token: u64,
}

impl Drop for CacheLock<'_> {
    fn drop(&mut self) {
        let removed = self
            .cache
            .entries
            .remove_if(&self.key, |_, entry| entry.owner == Some(self.token));
        if removed.is_some() {
            tracing::debug!(key = %self.key, "refresh lock released");
        } else {
            tracing::debug!(key = %self.key, "refresh lock expired before release");
        }
    }
}
