//! Cache that never stores anything.

use super::CacheInterface;
use async_trait::async_trait;
use keystone_core::KeystoneResult;
use std::time::Duration;

/// Always-empty cache. Services behave identically with it, only slower.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

#[async_trait]
impl CacheInterface for NoopCache {
    async fn get_raw(&self, _key: &str) -> KeystoneResult<Option<String>> {
        Ok(None)
    }

    async fn set_raw(&self, _key: &str, _value: &str, _ttl: Option<Duration>) -> KeystoneResult<bool> {
        Ok(false)
    }

    async fn delete_raw(&self, _key: &str) -> KeystoneResult<bool> {
        Ok(false)
    }

    async fn exists_raw(&self, _key: &str) -> KeystoneResult<bool> {
        Ok(false)
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
