// Test doubles shared by unit tests.
// Scripted transport, always-failing store, recording notifier, and JSON fixtures.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::cache::store::{KeyValueStore, MemoryStore, StorageResult};
use crate::cache::ExpiringCache;
use crate::config::Config;
use crate::error::{GhError, Result, StorageError};
use crate::github::RateAwareFetcher;
use crate::github::notice::{RateLimitNotice, RateLimitNotifier};
use crate::github::transport::{HttpResponse, HttpTransport};
use crate::service::GitHubService;

/// Transport answering from a URL → response table and recording every call.
/// Unscripted URLs fail like a refused connection.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<HashMap<String, HttpResponse>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, response: HttpResponse) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
    }

    pub fn respond_json(&self, url: &str, body: &Value) {
        self.respond(url, HttpResponse::new(200, body.to_string()));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.calls.lock().unwrap().push(url.to_string());
        self.responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| {
                GhError::Io(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    format!("no scripted response for {url}"),
                ))
            })
    }
}

/// Store whose every operation fails.
pub struct FailingStore;

fn unavailable() -> StorageError {
    StorageError::Io(io::Error::other("store unavailable"))
}

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> StorageResult<Option<String>> {
        Err(unavailable())
    }

    async fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
        Err(unavailable())
    }

    async fn remove(&self, _key: &str) -> StorageResult<()> {
        Err(unavailable())
    }

    async fn remove_many(&self, _keys: &[String]) -> StorageResult<()> {
        Err(unavailable())
    }

    async fn list_all_keys(&self) -> StorageResult<Vec<String>> {
        Err(unavailable())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<RateLimitNotice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<RateLimitNotice> {
        self.notices.lock().unwrap().clone()
    }
}

impl RateLimitNotifier for RecordingNotifier {
    fn rate_limit_exceeded(&self, notice: &RateLimitNotice) {
        self.notices.lock().unwrap().push(notice.clone());
    }
}

pub const API_BASE: &str = "https://api.test";

/// Service wired to a scripted transport and an inspectable store.
pub struct Harness {
    pub service: GitHubService,
    pub store: Arc<MemoryStore>,
    pub transport: Arc<ScriptedTransport>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::build(store.clone(), store)
    }

    /// Service backed by `backing`; `store` is then a detached, empty store.
    pub fn with_store(backing: Arc<dyn KeyValueStore>) -> Self {
        Self::build(backing, Arc::new(MemoryStore::new()))
    }

    fn build(backing: Arc<dyn KeyValueStore>, store: Arc<MemoryStore>) -> Self {
        let config = Config {
            api_base_url: API_BASE.to_string(),
            ..Config::default()
        };
        let transport = Arc::new(ScriptedTransport::new());
        let notifier = Arc::new(RecordingNotifier::default());

        let cache = ExpiringCache::new(backing, config.prefixes.clone())
            .with_default_ttl(config.cache_ttl());
        let fetcher = RateAwareFetcher::new(
            transport.clone(),
            notifier.clone(),
            config.api_base_url.clone(),
        );

        Self {
            service: GitHubService::new(cache, fetcher, &config),
            store,
            transport,
            notifier,
        }
    }
}

pub fn user_json(login: &str, id: u64) -> Value {
    json!({
        "id": id,
        "login": login,
        "type": "User",
        "avatar_url": format!("https://avatars.test/{login}"),
        "html_url": format!("https://github.com/{login}"),
        "name": "The Octocat",
        "public_repos": 8,
        "public_gists": 8,
        "followers": 42,
        "following": 9,
        "created_at": "2011-01-25T18:44:36Z",
        "updated_at": "2024-01-01T00:00:00Z"
    })
}

pub fn follower_json(login: &str, id: u64) -> Value {
    json!({
        "id": id,
        "login": login,
        "type": "User",
        "avatar_url": format!("https://avatars.test/{login}"),
        "html_url": format!("https://github.com/{login}")
    })
}

pub fn repo_json(name: &str, language: Option<&str>, stars: u64, size: u64) -> Value {
    json!({
        "id": stars * 1000 + size,
        "name": name,
        "full_name": format!("octocat/{name}"),
        "owner": { "login": "octocat", "avatar_url": "https://avatars.test/octocat" },
        "description": null,
        "language": language,
        "stargazers_count": stars,
        "forks_count": 1,
        "watchers_count": stars,
        "size": size,
        "default_branch": "main",
        "topics": []
    })
}
