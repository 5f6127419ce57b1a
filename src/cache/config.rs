//! Cache configuration.
//!
//! Selects the backend and tunes the in-process store via the `[cache]` table.

use std::num::NonZeroUsize;

use serde::Deserialize;

const DEFAULT_ENTRY_LIMIT: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    #[default]
    Memory,
    Redis,
}

impl CacheBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheBackend::Memory => "memory",
            CacheBackend::Redis => "redis",
        }
    }
}

impl std::str::FromStr for CacheBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(CacheBackend::Memory),
            "redis" => Ok(CacheBackend::Redis),
            other => Err(format!("unknown cache backend `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Backend holding cached entries.
    pub backend: CacheBackend,
    /// Connection URL, required for the redis backend.
    pub redis_url: Option<String>,
    /// Maximum entries kept by the memory backend.
    pub entry_limit: usize,
    /// Re-apply each invalidation plan after the store write succeeds.
    pub invalidate_after_write: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            redis_url: None,
            entry_limit: DEFAULT_ENTRY_LIMIT,
            invalidate_after_write: false,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            backend: settings.backend,
            redis_url: settings.redis_url.clone(),
            entry_limit: settings.entry_limit,
            invalidate_after_write: settings.invalidate_after_write,
        }
    }
}

impl CacheConfig {
    /// Returns the entry limit as NonZeroUsize, clamping to 1 if zero.
    pub fn entry_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.entry_limit).unwrap_or(NonZeroUsize::MIN)
    }
}
