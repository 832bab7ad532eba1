// Cache module for persistent response caching.
// Stores GitHub API responses with a TTL so repeated lookups skip the network.

pub mod expiring;
pub mod keys;
pub mod paths;
pub mod store;

pub use expiring::{CacheLookup, DEFAULT_TTL, ExpiringCache};
pub use keys::{KeyPrefixes, ResourceKind};
pub use store::{FileStore, KeyValueStore, MemoryStore, StorageResult};
