//! In-memory `CacheStore`.
//!
//! Keeps generations in insertion order behind a tokio RwLock. Nothing
//! survives a restart; used by tests and by `db_path = ":memory:"` setups
//! that only want the routing behaviour.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::entries::CachedResponse;
use super::store::CacheStore;
use crate::Error;

#[derive(Debug, Default)]
pub struct MemoryStore {
    generations: RwLock<Vec<(String, HashMap<String, CachedResponse>)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn open(&self, generation: &str) -> Result<(), Error> {
        let mut generations = self.generations.write().await;
        if !generations.iter().any(|(name, _)| name == generation) {
            generations.push((generation.to_string(), HashMap::new()));
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<CachedResponse>, Error> {
        let generations = self.generations.read().await;
        Ok(generations.iter().find_map(|(_, entries)| entries.get(key).cloned()))
    }

    async fn put(&self, generation: &str, key: &str, entry: CachedResponse) -> Result<(), Error> {
        let mut generations = self.generations.write().await;
        match generations.iter_mut().find(|(name, _)| name == generation) {
            Some((_, entries)) => {
                entries.insert(key.to_string(), entry);
            }
            None => {
                generations.push((generation.to_string(), HashMap::from([(key.to_string(), entry)])));
            }
        }
        Ok(())
    }

    async fn delete_generation(&self, name: &str) -> Result<bool, Error> {
        let mut generations = self.generations.write().await;
        let before = generations.len();
        generations.retain(|(existing, _)| existing != name);
        Ok(generations.len() != before)
    }

    async fn list_generations(&self) -> Result<Vec<String>, Error> {
        let generations = self.generations.read().await;
        Ok(generations.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn count(&self, generation: &str) -> Result<u64, Error> {
        let generations = self.generations.read().await;
        Ok(generations
            .iter()
            .find(|(name, _)| name == generation)
            .map_or(0, |(_, entries)| entries.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Request, Response};
    use http::StatusCode;
    use url::Url;

    fn entry(url: &str, body: &'static str) -> (String, CachedResponse) {
        let request = Request::get(Url::parse(url).unwrap());
        let response = Response::new(StatusCode::OK, body);
        (request.cache_key(), CachedResponse::capture(&request, &response))
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let store = MemoryStore::new();
        let (key, cached) = entry("https://example.com/general/home", "home");
        store.put("app-dynamic-v1", &key, cached.clone()).await.unwrap();

        assert_eq!(store.get(&key).await.unwrap(), Some(cached));
        assert_eq!(store.count("app-dynamic-v1").await.unwrap(), 1);
        assert_eq!(store.list_generations().await.unwrap(), vec!["app-dynamic-v1".to_string()]);
    }

    #[tokio::test]
    async fn test_get_searches_generations_in_order() {
        let store = MemoryStore::new();
        store.open("first").await.unwrap();
        let (key, older) = entry("https://example.com/a", "older");
        let (_, newer) = entry("https://example.com/a", "newer");
        store.put("second", &key, newer).await.unwrap();
        store.put("first", &key, older.clone()).await.unwrap();

        assert_eq!(store.get(&key).await.unwrap(), Some(older));
    }

    #[tokio::test]
    async fn test_delete_generation() {
        let store = MemoryStore::new();
        let (key, cached) = entry("https://example.com/static/css/styles.css", "css");
        store.put("old", &key, cached).await.unwrap();

        assert!(store.delete_generation("old").await.unwrap());
        assert!(!store.delete_generation("old").await.unwrap());
        assert!(store.get(&key).await.unwrap().is_none());
        assert_eq!(store.count("old").await.unwrap(), 0);
    }
}
