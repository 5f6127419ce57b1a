//! Redis-backed cache shared by every process serving the catalog.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::debug;

use super::keys::{CacheKey, KeyPrefix};
use super::store::{Cache, CacheError};

const SCAN_BATCH: usize = 500;

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::backend(err)
    }
}

#[derive(Clone)]
pub struct RedisCache {
    manager: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;
        Ok(Self { manager })
    }

    /// Collects matching keys with `SCAN` so large keyspaces never block the server.
    async fn scan_prefix(&self, prefix: &KeyPrefix) -> Result<Vec<String>, CacheError> {
        let mut conn = self.manager.clone();
        let pattern = format!("{}*", escape_glob(&prefix.to_string()));
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(keys)
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.manager.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        let mut conn = self.manager.clone();
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    async fn delete_exact(&self, keys: &[CacheKey]) -> Result<(), CacheError> {
        if keys.is_empty() {
            return Ok(());
        }
        let rendered: Vec<String> = keys.iter().map(ToString::to_string).collect();
        let mut conn = self.manager.clone();
        let _: () = conn.del(rendered).await?;
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &KeyPrefix) -> Result<(), CacheError> {
        let keys = self.scan_prefix(prefix).await?;
        debug!(
            target = "carte::cache::redis",
            prefix = %prefix,
            matched = keys.len(),
            "purging keys by prefix"
        );
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.manager.clone();
        let _: () = conn.del(keys).await?;
        Ok(())
    }
}

fn escape_glob(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
