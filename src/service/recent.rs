// Recent searches.
// A short most-recent-first list of looked-up users, kept outside the cache namespaces.

use tracing::warn;

use crate::cache::KeyValueStore;
use crate::github::{RecentSearch, User};

use super::GitHubService;

/// Number of recent searches retained.
pub const MAX_RECENT_SEARCHES: usize = 5;

impl GitHubService {
    /// Stored recent searches; empty when absent or unreadable.
    pub async fn recent_searches(&self) -> Vec<RecentSearch> {
        let store = self.cache.store();
        let stored = match store.get(&self.recent_searches_key).await {
            Ok(Some(stored)) => stored,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to read recent searches");
                return Vec::new();
            }
        };

        serde_json::from_str(&stored).unwrap_or_else(|e| {
            warn!(error = %e, "discarding unreadable recent searches");
            Vec::new()
        })
    }

    /// Put `user` at the front of the list unless already present, keeping at most
    /// `MAX_RECENT_SEARCHES`. Returns the resulting list.
    pub async fn record_recent_search(&self, user: &User) -> Vec<RecentSearch> {
        let mut searches = self.recent_searches().await;
        if searches.iter().any(|search| search.login == user.login) {
            return searches;
        }

        searches.insert(0, RecentSearch::from(user));
        searches.truncate(MAX_RECENT_SEARCHES);
        self.store_recent_searches(&searches).await;
        searches
    }

    pub async fn store_recent_searches(&self, searches: &[RecentSearch]) -> bool {
        let serialized = match serde_json::to_string(searches) {
            Ok(serialized) => serialized,
            Err(e) => {
                warn!(error = %e, "failed to serialize recent searches");
                return false;
            }
        };

        match self
            .cache
            .store()
            .set(&self.recent_searches_key, &serialized)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to store recent searches");
                false
            }
        }
    }

    pub async fn clear_recent_searches(&self) -> bool {
        match self.cache.store().remove(&self.recent_searches_key).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to clear recent searches");
                false
            }
        }
    }
}
