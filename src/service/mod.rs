// Data access layer.
// Cache-aside reads of GitHub resources on top of the expiring cache and the rate-aware fetcher.

pub mod recent;
pub mod repos;
pub mod stats;
pub mod users;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::cache::{CacheLookup, ExpiringCache, FileStore, KeyValueStore, MemoryStore, ResourceKind};
use crate::config::Config;
use crate::error::Result;
use crate::github::{
    LogNotifier, RateAwareFetcher, RateLimitNotifier, RateLimitState, ReqwestTransport, decode,
};

pub use recent::MAX_RECENT_SEARCHES;
pub use stats::{ContributionStats, GithubAge, LanguageShare, SizeBucket, StarredRepo};

/// Entry point for every consumer-facing GitHub operation.
///
/// Concurrent misses for the same key are not coordinated: each issues its own
/// fetch and the later write-through wins.
pub struct GitHubService {
    cache: ExpiringCache,
    fetcher: RateAwareFetcher,
    per_page: u32,
    search_per_page: u32,
    recent_searches_key: String,
}

impl GitHubService {
    pub fn new(cache: ExpiringCache, fetcher: RateAwareFetcher, config: &Config) -> Self {
        Self {
            cache,
            fetcher,
            per_page: config.per_page,
            search_per_page: config.search_per_page,
            recent_searches_key: config.recent_searches_key.clone(),
        }
    }

    /// Production wiring: reqwest transport and a file store in the platform cache directory.
    /// Falls back to an in-memory store when no cache directory can be resolved.
    pub fn from_config(config: &Config, notifier: Arc<dyn RateLimitNotifier>) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(&config.user_agent, config.timeout())?);
        let store: Arc<dyn KeyValueStore> = match config.resolved_store_path() {
            Some(path) => Arc::new(FileStore::new(path)),
            None => Arc::new(MemoryStore::new()),
        };

        let cache =
            ExpiringCache::new(store, config.prefixes.clone()).with_default_ttl(config.cache_ttl());
        let fetcher = RateAwareFetcher::new(transport, notifier, config.api_base_url.clone());
        Ok(Self::new(cache, fetcher, config))
    }

    /// Production wiring with notices going to the log only.
    pub fn with_defaults(config: &Config) -> Result<Self> {
        Self::from_config(config, Arc::new(LogNotifier))
    }

    pub fn cache(&self) -> &ExpiringCache {
        &self.cache
    }

    /// Pre-flight rate limit probe.
    pub async fn check_rate_limits(&self) -> RateLimitState {
        self.fetcher.check_rate_limits().await
    }

    /// Cache-aside read: serve a fresh entry, otherwise fetch, validate, and write through.
    /// `login` must already have passed `validate_login`.
    ///
    /// The raw body is cached, not the typed record, so the cache never loses fields.
    /// Write-through failures are ignored.
    async fn cached<T: DeserializeOwned>(
        &self,
        kind: ResourceKind,
        login: &str,
        page: Option<u32>,
        segments: &[&str],
        params: &[(&str, String)],
    ) -> Result<T> {
        let key = self.cache.prefixes().key(kind, login, page);

        if let CacheLookup::Hit(value) = self.cache.get::<T>(&key).await {
            debug!(key, "using cached data");
            return Ok(value);
        }

        let body = self.fetcher.fetch(segments, params).await?;
        let value = decode::<T>(&body)?;
        self.cache.put_default(&key, &body).await;
        Ok(value)
    }

    fn page_params(&self, page: u32, per_page: u32) -> Vec<(&'static str, String)> {
        vec![("page", page.to_string()), ("per_page", per_page.to_string())]
    }
}
