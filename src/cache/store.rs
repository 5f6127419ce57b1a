//! Cache storage contract and the in-process implementation.

use std::sync::RwLock;

use async_trait::async_trait;
use lru::LruCache;
use metrics::counter;
use thiserror::Error;

use crate::infra::telemetry::names;

use super::config::CacheConfig;
use super::keys::{CacheKey, KeyPrefix};
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
    #[error("cache payload could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CacheError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Key/value cache holding serialized records.
///
/// Entries never expire on their own; they live until deleted or, for bounded
/// backends, evicted.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Overwrites any existing value.
    async fn set(&self, key: &str, value: String) -> Result<(), CacheError>;

    async fn delete_exact(&self, keys: &[CacheKey]) -> Result<(), CacheError>;

    /// Removes every key starting with the literal prefix.
    async fn delete_prefix(&self, prefix: &KeyPrefix) -> Result<(), CacheError>;
}

/// In-process LRU cache.
pub struct MemoryCache {
    entries: RwLock<LruCache<String, String>>,
}

impl MemoryCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.entry_limit_non_zero())),
        }
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks presence without touching recency.
    pub fn contains(&self, key: &str) -> bool {
        rw_read(&self.entries, SOURCE, "contains").contains(key)
    }

    pub fn keys(&self) -> Vec<String> {
        rw_read(&self.entries, SOURCE, "keys")
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(rw_write(&self.entries, SOURCE, "get").get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        let evicted = rw_write(&self.entries, SOURCE, "set").push(key.to_string(), value);
        if let Some((evicted_key, _)) = evicted
            && evicted_key != key
        {
            counter!(names::CACHE_EVICT).increment(1);
        }
        Ok(())
    }

    async fn delete_exact(&self, keys: &[CacheKey]) -> Result<(), CacheError> {
        let mut entries = rw_write(&self.entries, SOURCE, "delete_exact");
        for key in keys {
            entries.pop(key.to_string().as_str());
        }
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &KeyPrefix) -> Result<(), CacheError> {
        let mut entries = rw_write(&self.entries, SOURCE, "delete_prefix");
        let doomed: Vec<String> = entries
            .iter()
            .filter(|(key, _)| prefix.matches(key))
            .map(|(key, _)| key.clone())
            .collect();
        for key in doomed {
            entries.pop(&key);
        }
        Ok(())
    }
}
