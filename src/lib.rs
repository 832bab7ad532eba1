// ghlens: GitHub user lookup with a persistent cache-aside data layer.
// Consumers call `GitHubService`; storage and transport are pluggable traits.

pub mod cache;
pub mod config;
pub mod error;
pub mod github;
pub mod service;

#[cfg(test)]
mod testing;

pub use cache::{CacheLookup, ExpiringCache, FileStore, KeyPrefixes, KeyValueStore, MemoryStore};
pub use config::Config;
pub use error::{GhError, Result, StorageError};
pub use github::{RateAwareFetcher, RateLimitNotifier, RateLimitState};
pub use service::GitHubService;
