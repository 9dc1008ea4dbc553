pub mod cache;
pub mod sort;

pub use cache::{
    CacheEntry, CacheLock, CacheStats, Clock, MAX_TTL, ManualClock, SystemClock, TtlCache,
    expiry_after, lock_key,
};
pub use sort::{SortKey, SortKeyError, sort_repositories};
