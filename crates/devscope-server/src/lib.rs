pub mod config;
pub mod explore;
pub mod handlers;
pub mod likes;
pub mod middleware;
pub mod observability;
pub mod profile;
pub mod server;

#[cfg(test)]
mod testing;

pub use config::{AppConfig, Environment, ExploreSettings, GitHubSettings, ServerConfig};
pub use explore::{ExploreError, ExploreOutcome, ExploreService};
pub use likes::LikeError;
pub use observability::init_tracing;
pub use profile::{ProfileError, ProfileOutcome};
pub use server::{AppState, DevscopeServer, ServerBuilder, build_app};
