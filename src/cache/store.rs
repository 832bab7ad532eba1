// Key-value store backends for the cache.
// Durable string-keyed storage with an in-memory and a single-file JSON implementation.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::error::StorageError;

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// String-keyed, string-valued persistent map.
///
/// Implementations serialize their own operations; callers do no extra locking
/// and there are no transactional guarantees across keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    async fn remove(&self, key: &str) -> StorageResult<()>;

    async fn remove_many(&self, keys: &[String]) -> StorageResult<()>;

    async fn list_all_keys(&self) -> StorageResult<Vec<String>>;
}

/// In-memory store, lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn remove_many(&self, keys: &[String]) -> StorageResult<()> {
        let mut entries = self.entries.write().await;
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }

    async fn list_all_keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }
}

/// Store persisted as a single JSON object on disk.
///
/// The file is loaded on first use and rewritten atomically (temp file then
/// rename) on every mutation. A mutation that fails to persist leaves the
/// in-memory view untouched.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<Option<BTreeMap<String, String>>>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the backing file, starting empty if it is missing or unreadable as JSON.
    async fn load(&self) -> StorageResult<BTreeMap<String, String>> {
        if !fs::try_exists(&self.path).await? {
            return Ok(BTreeMap::new());
        }

        let contents = fs::read_to_string(&self.path).await?;
        match serde_json::from_str(&contents) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "discarding corrupt store file");
                Ok(BTreeMap::new())
            }
        }
    }

    async fn persist(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string(entries)?;

        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(json.as_bytes()).await?;
        file.sync_all().await?;
        fs::rename(&temp_path, &self.path).await?;

        debug!(path = %self.path.display(), keys = entries.len(), "store persisted");
        Ok(())
    }

    /// Apply `change` to a copy of the map, persist it, then commit it in memory.
    async fn mutate<F>(&self, change: F) -> StorageResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>) + Send,
    {
        let mut guard = self.entries.lock().await;
        let mut next = match guard.as_ref() {
            Some(entries) => entries.clone(),
            None => self.load().await?,
        };

        change(&mut next);
        self.persist(&next).await?;
        *guard = Some(next);
        Ok(())
    }

    async fn read<R, F>(&self, read: F) -> StorageResult<R>
    where
        F: FnOnce(&BTreeMap<String, String>) -> R + Send,
    {
        let mut guard = self.entries.lock().await;
        let entries = match guard.take() {
            Some(entries) => entries,
            None => self.load().await?,
        };

        let result = read(&entries);
        *guard = Some(entries);
        Ok(result)
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.read(|entries| entries.get(key).cloned()).await
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let (key, value) = (key.to_string(), value.to_string());
        self.mutate(move |entries| {
            entries.insert(key, value);
        })
        .await
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.mutate(|entries| {
            entries.remove(key);
        })
        .await
    }

    async fn remove_many(&self, keys: &[String]) -> StorageResult<()> {
        self.mutate(|entries| {
            for key in keys {
                entries.remove(key);
            }
        })
        .await
    }

    async fn list_all_keys(&self) -> StorageResult<Vec<String>> {
        self.read(|entries| entries.keys().cloned().collect()).await
    }
}
