//! In-process TTL cache used by the request handlers.
//!
//! ## Architecture
//!
//! - **Entries**: JSON values keyed by string, each with its own expiry instant
//! - **Locks**: sentinel entries stored under `<key>_lock` that mark a refresh
//!   of `<key>` as in flight
//! - **Clock**: time is read through an injected [`Clock`] so tests can move it
//!
//! ## Lookup
//!
//! ```text
//! GET /api/explore/rust → get("popular_rust") → hit: respond
//!                                ↓ miss
//!                       try_lock("popular_rust") → held: 503
//!                                ↓ acquired
//!                       GitHub search → put(...) → guard dropped (lock released)
//! ```
//!
//! The cache is process-local. Locks do not coordinate multiple instances.

pub mod clock;
pub mod store;

pub use clock::{Clock, MAX_TTL, ManualClock, SystemClock, expiry_after};
pub use store::{CacheEntry, CacheLock, CacheStats, TtlCache, lock_key};
