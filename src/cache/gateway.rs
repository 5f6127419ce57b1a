//! Read-through and write-invalidate orchestration over a [`Cache`] backend.
//!
//! Failure policy: lookups and populates fail open (the store stays the source
//! of truth), while pre-write invalidation fails closed so a write never
//! commits while entries it makes stale are still reachable.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info, warn};

use crate::infra::telemetry::names;

use super::config::CacheConfig;
use super::keys::CacheKey;
use super::planner::{InvalidationPlan, Mutation};
use super::store::{Cache, CacheError};

#[derive(Clone)]
pub struct CacheGateway {
    cache: Arc<dyn Cache>,
    invalidate_after_write: bool,
}

impl CacheGateway {
    pub fn new(cache: Arc<dyn Cache>, config: &CacheConfig) -> Self {
        Self {
            cache,
            invalidate_after_write: config.invalidate_after_write,
        }
    }

    /// Serve `key` from cache, or run `load` and cache its successful result.
    pub async fn read_through<T, E, F, Fut>(&self, key: CacheKey, load: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.lookup(&key).await {
            return Ok(hit);
        }

        let value = load().await?;
        self.populate(&key, &value).await;
        Ok(value)
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let rendered = key.to_string();
        let raw = match self.cache.get(&rendered).await {
            Ok(raw) => raw,
            Err(err) => {
                counter!(names::CACHE_ERROR, "op" => "get").increment(1);
                warn!(
                    target = "carte::cache::gateway",
                    key = %rendered,
                    error = %err,
                    "cache lookup failed; reading from store"
                );
                return None;
            }
        };

        let Some(raw) = raw else {
            counter!(names::CACHE_MISS, "key_kind" => key.kind()).increment(1);
            debug!(target = "carte::cache::gateway", key = %rendered, "cache miss");
            return None;
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                counter!(names::CACHE_HIT, "key_kind" => key.kind()).increment(1);
                debug!(target = "carte::cache::gateway", key = %rendered, "cache hit");
                Some(value)
            }
            Err(err) => {
                counter!(names::CACHE_ERROR, "op" => "decode").increment(1);
                warn!(
                    target = "carte::cache::gateway",
                    key = %rendered,
                    error = %err,
                    "cached entry could not be decoded; treating as miss"
                );
                None
            }
        }
    }

    async fn populate<T: Serialize>(&self, key: &CacheKey, value: &T) {
        let rendered = key.to_string();
        let result = match serde_json::to_string(value) {
            Ok(payload) => self.cache.set(&rendered, payload).await,
            Err(err) => Err(CacheError::from(err)),
        };

        if let Err(err) = result {
            counter!(names::CACHE_ERROR, "op" => "set").increment(1);
            warn!(
                target = "carte::cache::gateway",
                key = %rendered,
                error = %err,
                "failed to populate cache entry"
            );
        }
    }

    /// Purge everything `mutation` makes stale. Call before touching the store.
    pub async fn invalidate(&self, mutation: Mutation) -> Result<InvalidationPlan, CacheError> {
        let plan = InvalidationPlan::for_mutation(mutation);
        let started = Instant::now();

        let result = self.apply(&plan).await;
        histogram!(names::CACHE_INVALIDATE_MS).record(started.elapsed().as_secs_f64() * 1000.0);

        match result {
            Ok(()) => {
                info!(
                    target = "carte::cache::gateway",
                    mutation = mutation.label(),
                    exact = plan.exact.len(),
                    prefixes = plan.prefixes.len(),
                    "cache invalidated"
                );
                debug!(target = "carte::cache::gateway", %plan, "invalidation plan");
                Ok(plan)
            }
            Err(err) => {
                counter!(names::CACHE_ERROR, "op" => "invalidate").increment(1);
                warn!(
                    target = "carte::cache::gateway",
                    mutation = mutation.label(),
                    error = %err,
                    "cache invalidation failed; rejecting write"
                );
                Err(err)
            }
        }
    }

    /// Re-apply `plan` once the store write has committed, when configured.
    ///
    /// Clears entries populated by readers that raced the write. Failures are
    /// only logged since the write is already durable.
    pub async fn settle(&self, plan: &InvalidationPlan) {
        if !self.invalidate_after_write {
            return;
        }
        if let Err(err) = self.apply(plan).await {
            counter!(names::CACHE_ERROR, "op" => "settle").increment(1);
            warn!(
                target = "carte::cache::gateway",
                error = %err,
                "post-write invalidation failed"
            );
        }
    }

    async fn apply(&self, plan: &InvalidationPlan) -> Result<(), CacheError> {
        if plan.is_empty() {
            return Ok(());
        }
        self.cache.delete_exact(&plan.exact_keys()).await?;
        for prefix in &plan.prefixes {
            self.cache.delete_prefix(prefix).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::cache::MemoryCache;

    fn build_gateway(invalidate_after_write: bool) -> (Arc<MemoryCache>, CacheGateway) {
        let config = CacheConfig {
            invalidate_after_write,
            ..Default::default()
        };
        let memory = Arc::new(MemoryCache::new(&config));
        let gateway = CacheGateway::new(memory.clone(), &config);
        (memory, gateway)
    }

    #[tokio::test]
    async fn read_through_loads_once_then_hits() {
        let (memory, gateway) = build_gateway(false);
        let loads = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Result<Vec<i64>, ()> = gateway
                .read_through(CacheKey::MenusList, || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![1, 2])
                })
                .await;
            assert_eq!(value, Ok(vec![1, 2]));
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(memory.contains("menus_list"));
    }

    #[tokio::test]
    async fn failed_load_does_not_populate() {
        let (memory, gateway) = build_gateway(false);
        let result: Result<i64, &str> = gateway
            .read_through(CacheKey::Menu { menu_id: 9 }, || async { Err("missing") })
            .await;

        assert_eq!(result, Err("missing"));
        assert!(memory.is_empty());
    }

    #[tokio::test]
    async fn undecodable_entry_is_treated_as_miss() {
        let (memory, gateway) = build_gateway(false);
        memory
            .set("menu_1", "not json".to_string())
            .await
            .unwrap();

        let value: Result<i64, ()> = gateway
            .read_through(CacheKey::Menu { menu_id: 1 }, || async { Ok(5) })
            .await;

        assert_eq!(value, Ok(5));
        assert_eq!(memory.get("menu_1").await.unwrap().as_deref(), Some("5"));
    }

    #[tokio::test]
    async fn settle_is_a_no_op_unless_enabled() {
        let (memory, gateway) = build_gateway(false);
        let plan = gateway.invalidate(Mutation::MenuCreated).await.unwrap();
        memory.set("menus_list", "[]".to_string()).await.unwrap();

        gateway.settle(&plan).await;
        assert!(memory.contains("menus_list"));

        let (memory, gateway) = build_gateway(true);
        let plan = gateway.invalidate(Mutation::MenuCreated).await.unwrap();
        memory.set("menus_list", "[]".to_string()).await.unwrap();

        gateway.settle(&plan).await;
        assert!(!memory.contains("menus_list"));
    }
}
