// Expiring cache layered over a key-value store.
// Adds per-entry TTL with lazy, read-time eviction; every failure degrades to a miss.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use super::keys::KeyPrefixes;
use super::store::KeyValueStore;

/// Default TTL for cached resources: 15 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

/// Outcome of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup<T> {
    Hit(T),
    Miss,
}

impl<T> CacheLookup<T> {
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheLookup::Hit(_))
    }
}

/// TTL cache storing each entry as a value record plus an expiry record.
///
/// The expiry record holds the expiry instant in epoch milliseconds under
/// `<expiry prefix><key>`, so freshness can be checked without reading the value.
/// Expired entries are only removed when a read discovers them.
#[derive(Clone)]
pub struct ExpiringCache {
    store: Arc<dyn KeyValueStore>,
    prefixes: KeyPrefixes,
    default_ttl: Duration,
}

impl ExpiringCache {
    pub fn new(store: Arc<dyn KeyValueStore>, prefixes: KeyPrefixes) -> Self {
        Self {
            store,
            prefixes,
            default_ttl: DEFAULT_TTL,
        }
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn prefixes(&self) -> &KeyPrefixes {
        &self.prefixes
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Store `value` with the default TTL.
    pub async fn put_default<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        self.put(key, value, self.default_ttl).await
    }

    /// Store `value` under `key` until `now + ttl`.
    ///
    /// Returns whether both records were written. Failures are logged, never raised.
    pub async fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) -> bool {
        let serialized = match serde_json::to_string(value) {
            Ok(serialized) => serialized,
            Err(e) => {
                warn!(key, error = %e, "failed to serialize cache value");
                return false;
            }
        };

        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at = Utc::now().timestamp_millis().saturating_add(ttl_ms);

        if let Err(e) = self.store.set(key, &serialized).await {
            warn!(key, error = %e, "failed to write cache value");
            return false;
        }

        let expiry_key = self.prefixes.expiry_key(key);
        if let Err(e) = self.store.set(&expiry_key, &expires_at.to_string()).await {
            warn!(key, error = %e, "failed to write cache expiry");
            return false;
        }

        debug!(key, expires_at, "cached");
        true
    }

    /// Look up `key`, evicting it if its TTL has passed.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> CacheLookup<T> {
        let expiry_key = self.prefixes.expiry_key(key);

        let expiry = match self.store.get(&expiry_key).await {
            Ok(Some(expiry)) => expiry,
            Ok(None) => return CacheLookup::Miss,
            Err(e) => {
                warn!(key, error = %e, "failed to read cache expiry");
                return CacheLookup::Miss;
            }
        };

        let expired = match expiry.trim().parse::<i64>() {
            Ok(expires_at) => Utc::now().timestamp_millis() > expires_at,
            Err(_) => true,
        };

        if expired {
            debug!(key, "cache entry expired");
            self.invalidate(key).await;
            return CacheLookup::Miss;
        }

        let serialized = match self.store.get(key).await {
            Ok(Some(serialized)) => serialized,
            Ok(None) => return CacheLookup::Miss,
            Err(e) => {
                warn!(key, error = %e, "failed to read cache value");
                return CacheLookup::Miss;
            }
        };

        match serde_json::from_str(&serialized) {
            Ok(value) => {
                debug!(key, "cache hit");
                CacheLookup::Hit(value)
            }
            Err(e) => {
                warn!(key, error = %e, "discarding undecodable cache value");
                CacheLookup::Miss
            }
        }
    }

    /// Remove the value and expiry records for `key`.
    pub async fn invalidate(&self, key: &str) -> bool {
        let keys = [key.to_string(), self.prefixes.expiry_key(key)];
        match self.store.remove_many(&keys).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "failed to remove cache entry");
                false
            }
        }
    }

    /// Remove every stored key accepted by `matches`.
    ///
    /// There is no index from identity to keys, so this scans the whole store.
    pub async fn remove_matching<F>(&self, matches: F) -> bool
    where
        F: Fn(&str) -> bool + Send,
    {
        let keys = match self.store.list_all_keys().await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "failed to list cache keys");
                return false;
            }
        };

        let doomed: Vec<String> = keys.into_iter().filter(|key| matches(key.as_str())).collect();
        if doomed.is_empty() {
            return true;
        }

        match self.store.remove_many(&doomed).await {
            Ok(()) => {
                debug!(removed = doomed.len(), "cache keys removed");
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to remove cache keys");
                false
            }
        }
    }
}
