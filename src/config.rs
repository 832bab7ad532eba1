// Runtime configuration.
// Loaded from an optional TOML file in the platform config directory; every field has a default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::{KeyPrefixes, paths};
use crate::error::{GhError, Result};

/// Environment variable overriding `api_base_url`.
pub const API_URL_ENV: &str = "GHLENS_API_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// GitHub REST API root
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Transport timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Page size for followers, following and repository listings
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Result count for search suggestions
    #[serde(default = "default_search_per_page")]
    pub search_per_page: u32,

    /// TTL of cached users and follower pages
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Store file override; the platform cache directory is used when unset
    #[serde(default)]
    pub store_path: Option<PathBuf>,

    /// Key under which recent searches are kept, outside the cache namespaces
    #[serde(default = "default_recent_searches_key")]
    pub recent_searches_key: String,

    #[serde(default)]
    pub prefixes: KeyPrefixes,
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_user_agent() -> String {
    format!("ghlens/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_per_page() -> u32 {
    30
}

fn default_search_per_page() -> u32 {
    5
}

fn default_cache_ttl_secs() -> u64 {
    15 * 60
}

fn default_recent_searches_key() -> String {
    "recentSearches".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            per_page: default_per_page(),
            search_per_page: default_search_per_page(),
            cache_ttl_secs: default_cache_ttl_secs(),
            store_path: None,
            recent_searches_key: default_recent_searches_key(),
            prefixes: KeyPrefixes::default(),
        }
    }
}

impl Config {
    /// Load from the platform config file if it exists, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match paths::config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };

        if let Ok(url) = std::env::var(API_URL_ENV) {
            config.api_base_url = url;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&contents)?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| GhError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.per_page == 0 || self.per_page > 100 {
            return Err(GhError::Config(format!(
                "per_page must be between 1 and 100, got {}",
                self.per_page
            )));
        }
        if self.search_per_page == 0 || self.search_per_page > 100 {
            return Err(GhError::Config(format!(
                "search_per_page must be between 1 and 100, got {}",
                self.search_per_page
            )));
        }
        self.prefixes.check_disjoint().map_err(GhError::Config)?;
        if self.prefixes.owns(&self.recent_searches_key) {
            return Err(GhError::Config(format!(
                "recent_searches_key {:?} falls inside a cache namespace",
                self.recent_searches_key
            )));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Store file location: the override, else the platform cache directory.
    pub fn resolved_store_path(&self) -> Option<PathBuf> {
        self.store_path.clone().or_else(paths::store_path)
    }
}
