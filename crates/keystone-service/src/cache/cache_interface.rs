//! Cache interface trait for abstracted caching operations.

use async_trait::async_trait;
use keystone_core::KeystoneResult;
use shaku::Interface;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Cache backend storing raw JSON strings.
///
/// Implementations may fail; callers go through [`CacheExt`], which turns
/// every failure into a miss. Absent and expired keys are both `None`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheInterface: Interface + Send + Sync {
    /// Get a raw JSON value from the cache.
    async fn get_raw(&self, key: &str) -> KeystoneResult<Option<String>>;

    /// Store a raw JSON value. `None` stores without expiry.
    ///
    /// Returns `true` if the value was stored.
    async fn set_raw(&self, key: &str, value: &str, ttl: Option<Duration>) -> KeystoneResult<bool>;

    /// Delete a value from the cache.
    ///
    /// Returns `true` if the key existed and was deleted.
    async fn delete_raw(&self, key: &str) -> KeystoneResult<bool>;

    /// Check if a live key exists in the cache.
    async fn exists_raw(&self, key: &str) -> KeystoneResult<bool>;

    /// Check if caching is enabled.
    fn is_enabled(&self) -> bool;
}

/// Typed, never-failing facade over any [`CacheInterface`].
#[async_trait]
pub trait CacheExt: CacheInterface {
    /// Get a typed value. Backend and decode failures are a miss.
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Option<T> {
        let json = match self.get_raw(key).await {
            Ok(Some(json)) => json,
            Ok(None) => {
                debug!("Cache miss for key '{}'", key);
                return None;
            }
            Err(e) => {
                warn!("Cache read failed for key '{}': {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&json) {
            Ok(value) => {
                debug!("Cache hit for key '{}'", key);
                Some(value)
            }
            Err(e) => {
                warn!("Discarding undecodable cache entry '{}': {}", key, e);
                None
            }
        }
    }

    /// Store a typed value. Returns `false` if nothing was stored.
    async fn set<T: Serialize + Sync>(&self, key: &str, value: &T, ttl: Option<Duration>) -> bool {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize cache entry '{}': {}", key, e);
                return false;
            }
        };

        self.set_raw(key, &json, ttl).await.unwrap_or_else(|e| {
            warn!("Cache write failed for key '{}': {}", key, e);
            false
        })
    }

    /// Remove a key. Returns `true` if it existed.
    async fn remove(&self, key: &str) -> bool {
        self.delete_raw(key).await.unwrap_or_else(|e| {
            warn!("Cache delete failed for key '{}': {}", key, e);
            false
        })
    }

    /// Check whether a key exists. Failures read as `false`.
    async fn exists(&self, key: &str) -> bool {
        self.exists_raw(key).await.unwrap_or_else(|e| {
            warn!("Cache exists check failed for key '{}': {}", key, e);
            false
        })
    }
}

impl<T: CacheInterface + ?Sized> CacheExt for T {}
