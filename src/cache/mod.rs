//! Carte cache layer
//!
//! Catalog reads are served read-through from a key/value cache, and every
//! write purges the affected keys before the store is touched:
//!
//! - **keys**: the literal key scheme (`menu_{m}`, `dish_{m}_{s}_{d}`, ...)
//! - **planner**: which keys and prefixes each mutation invalidates
//! - **gateway**: read-through/invalidate orchestration and failure policy
//! - **store** / **redis_cache**: the in-process LRU and Redis backends
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! backend = "memory"        # or "redis"
//! redis_url = "redis://127.0.0.1:6379/0"
//! entry_limit = 10000
//! invalidate_after_write = false
//! ```

mod config;
mod gateway;
mod keys;
mod lock;
mod planner;
mod redis_cache;
mod store;

use std::sync::Arc;

pub use config::{CacheBackend, CacheConfig};
pub use gateway::CacheGateway;
pub use keys::{CacheKey, KeyPrefix};
pub use planner::{InvalidationPlan, Mutation};
pub use redis_cache::RedisCache;
pub use store::{Cache, CacheError, MemoryCache};

/// Build the configured backend, connecting to Redis when selected.
pub async fn connect_backend(config: &CacheConfig) -> Result<Arc<dyn Cache>, CacheError> {
    match config.backend {
        CacheBackend::Memory => Ok(Arc::new(MemoryCache::new(config))),
        CacheBackend::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .ok_or_else(|| CacheError::backend("redis backend selected without redis_url"))?;
            Ok(Arc::new(RedisCache::connect(url).await?))
        }
    }
}
