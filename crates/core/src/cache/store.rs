//! Storage seam between the worker and its persistence.
//!
//! The worker only ever talks to a `CacheStore`, so the routing strategies can
//! be exercised against `MemoryStore` while the proxy uses SQLite.

use async_trait::async_trait;

use super::connection::CacheDb;
use super::entries::CachedResponse;
use crate::Error;

/// Generation-partitioned response cache.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Create a generation if it doesn't exist yet.
    async fn open(&self, generation: &str) -> Result<(), Error>;

    /// Look a key up across all generations, oldest generation first.
    async fn get(&self, key: &str) -> Result<Option<CachedResponse>, Error>;

    /// Store an entry, replacing any previous one under the same key.
    async fn put(&self, generation: &str, key: &str, entry: CachedResponse) -> Result<(), Error>;

    /// Drop a whole generation. Returns false if it did not exist.
    async fn delete_generation(&self, name: &str) -> Result<bool, Error>;

    /// Generation names, oldest first.
    async fn list_generations(&self) -> Result<Vec<String>, Error>;

    /// Number of entries in a generation.
    async fn count(&self, generation: &str) -> Result<u64, Error>;
}

#[async_trait]
impl CacheStore for CacheDb {
    async fn open(&self, generation: &str) -> Result<(), Error> {
        self.open_generation(generation).await
    }

    async fn get(&self, key: &str) -> Result<Option<CachedResponse>, Error> {
        self.match_entry(key).await
    }

    async fn put(&self, generation: &str, key: &str, entry: CachedResponse) -> Result<(), Error> {
        self.put_entry(generation, key, &entry).await
    }

    async fn delete_generation(&self, name: &str) -> Result<bool, Error> {
        CacheDb::delete_generation(self, name).await
    }

    async fn list_generations(&self) -> Result<Vec<String>, Error> {
        CacheDb::list_generations(self).await
    }

    async fn count(&self, generation: &str) -> Result<u64, Error> {
        self.count_entries(generation).await
    }
}
