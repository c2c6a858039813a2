//! In-process cache with per-entry expiry.

use super::CacheInterface;
use async_trait::async_trait;
use keystone_core::KeystoneResult;
use moka::future::Cache;
use moka::Expiry;
use std::time::{Duration, Instant};

/// Upper bound on entries before the least recently used are evicted.
pub const DEFAULT_MAX_CAPACITY: u64 = 10_000;

#[derive(Clone)]
struct Entry {
    value: String,
    ttl: Option<Duration>,
}

/// Expires every entry after the TTL it was written with.
struct EntryTtl;

impl Expiry<String, Entry> for EntryTtl {
    fn expire_after_create(&self, _key: &String, entry: &Entry, _created_at: Instant) -> Option<Duration> {
        entry.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        entry.ttl
    }
}

/// TTL-aware in-memory cache backed by `moka`.
///
/// Expired entries are never returned and are reclaimed by the cache's
/// housekeeping whether or not they are read again.
#[derive(Clone)]
pub struct InMemoryCache {
    entries: Cache<String, Entry>,
}

impl InMemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_capacity(DEFAULT_MAX_CAPACITY)
    }

    #[must_use]
    pub fn with_max_capacity(max_capacity: u64) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(max_capacity)
                .expire_after(EntryTtl)
                .build(),
        }
    }

    /// Number of live entries after pending evictions have run.
    pub async fn len(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCache")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

#[async_trait]
impl CacheInterface for InMemoryCache {
    async fn get_raw(&self, key: &str) -> KeystoneResult<Option<String>> {
        Ok(self.entries.get(key).await.map(|entry| entry.value))
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Option<Duration>) -> KeystoneResult<bool> {
        let entry = Entry {
            value: value.to_string(),
            ttl,
        };
        self.entries.insert(key.to_string(), entry).await;
        Ok(true)
    }

    async fn delete_raw(&self, key: &str) -> KeystoneResult<bool> {
        let existed = self.entries.get(key).await.is_some();
        self.entries.invalidate(key).await;
        Ok(existed)
    }

    async fn exists_raw(&self, key: &str) -> KeystoneResult<bool> {
        Ok(self.entries.get(key).await.is_some())
    }

    fn is_enabled(&self) -> bool {
        true
    }
}
