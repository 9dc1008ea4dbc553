//! Storage for user records and browser sessions.
//!
//! User records sit behind the [`UserStorage`] trait so a document store can
//! replace [`InMemoryUserStorage`]. Sessions and pending logins are
//! process-local.

pub mod memory;
pub mod session;
pub mod user;

pub use memory::InMemoryUserStorage;
pub use session::{Session, SessionStore};
pub use user::{StorageError, UserStorage};
