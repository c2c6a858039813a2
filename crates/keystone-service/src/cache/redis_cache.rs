//! Redis-based cache implementation.

use super::CacheInterface;
use async_trait::async_trait;
use deadpool_redis::{redis::AsyncCommands, Config, Pool, PoolConfig, Runtime};
use keystone_config::RedisConfig;
use keystone_core::{KeystoneError, KeystoneResult};
use shaku::Component;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default TTL for cached items (5 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

const PROBE_INITIAL_DELAY: Duration = Duration::from_secs(1);
const PROBE_MAX_DELAY: Duration = Duration::from_secs(30);

/// Redis-based cache service.
#[derive(Component, Clone)]
#[shaku(interface = CacheInterface)]
pub struct RedisCacheService {
    /// Redis connection pool. `None` when caching is disabled.
    #[shaku(default)]
    pool: Option<Arc<Pool>>,
}

impl RedisCacheService {
    /// Create a new Redis cache service.
    #[must_use]
    pub fn new(pool: Arc<Pool>) -> Self {
        Self { pool: Some(pool) }
    }

    /// Create a no-op cache service (for when Redis is disabled).
    #[must_use]
    pub const fn disabled() -> Self {
        Self { pool: None }
    }

    /// Builds the cache from configuration without ever failing startup.
    ///
    /// The pool connects lazily. A background probe pings Redis until it
    /// answers and logs when it becomes reachable; until then every cache
    /// call is a miss. A malformed URL or disabled config yields
    /// [`RedisCacheService::disabled`].
    #[must_use]
    pub fn connect(config: &RedisConfig) -> Self {
        if !config.enabled {
            info!("Redis cache disabled by configuration");
            return Self::disabled();
        }

        let mut cfg = Config::from_url(config.connection_string.as_str());
        cfg.pool = Some(PoolConfig::new(config.pool_size.max(1)));

        let pool = match cfg.create_pool(Some(Runtime::Tokio1)) {
            Ok(pool) => Arc::new(pool),
            Err(e) => {
                warn!("Redis cache unavailable, continuing without cache: {}", e);
                return Self::disabled();
            }
        };

        tokio::spawn(probe_until_reachable(Arc::clone(&pool)));

        Self::new(pool)
    }

    /// Module parameters that register this cache's pool.
    #[must_use]
    pub fn into_parameters(self) -> RedisCacheServiceParameters {
        RedisCacheServiceParameters { pool: self.pool }
    }

    /// Get a connection from the pool.
    async fn get_conn(&self) -> KeystoneResult<deadpool_redis::Connection> {
        match &self.pool {
            Some(pool) => pool.get().await.map_err(|e| {
                KeystoneError::Cache(format!("Failed to get Redis connection: {}", e))
            }),
            None => Err(KeystoneError::Cache("Cache is disabled".to_string())),
        }
    }
}

impl std::fmt::Debug for RedisCacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheService")
            .field("enabled", &self.pool.is_some())
            .finish()
    }
}

async fn ping(pool: &Pool) -> KeystoneResult<()> {
    let mut conn = pool
        .get()
        .await
        .map_err(|e| KeystoneError::Cache(e.to_string()))?;
    let _: String = deadpool_redis::redis::cmd("PING")
        .query_async(&mut conn)
        .await
        .map_err(|e| KeystoneError::Cache(e.to_string()))?;
    Ok(())
}

async fn probe_until_reachable(pool: Arc<Pool>) {
    let mut delay = PROBE_INITIAL_DELAY;
    loop {
        match ping(&pool).await {
            Ok(()) => {
                info!("Redis cache is reachable");
                return;
            }
            Err(e) => {
                warn!("Redis not reachable, retrying in {:?}: {}", delay, e);
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(PROBE_MAX_DELAY);
            }
        }
    }
}

#[async_trait]
impl CacheInterface for RedisCacheService {
    fn is_enabled(&self) -> bool {
        self.pool.is_some()
    }

    async fn get_raw(&self, key: &str) -> KeystoneResult<Option<String>> {
        if !self.is_enabled() {
            return Ok(None);
        }

        let mut conn = self.get_conn().await?;
        let value: Option<String> = conn.get(key).await.map_err(|e| {
            KeystoneError::Cache(format!("Failed to get key '{}': {}", key, e))
        })?;

        Ok(value)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Option<Duration>) -> KeystoneResult<bool> {
        if !self.is_enabled() {
            return Ok(false);
        }

        let mut conn = self.get_conn().await?;
        let result = match ttl {
            Some(ttl) => {
                let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
                conn.pset_ex::<_, _, ()>(key, value, millis).await
            }
            None => conn.set::<_, _, ()>(key, value).await,
        };
        result.map_err(|e| KeystoneError::Cache(format!("Failed to set key '{}': {}", key, e)))?;

        debug!("Cached key '{}' with TTL {:?}", key, ttl);
        Ok(true)
    }

    async fn delete_raw(&self, key: &str) -> KeystoneResult<bool> {
        if !self.is_enabled() {
            return Ok(false);
        }

        let mut conn = self.get_conn().await?;
        let deleted: i64 = conn.del(key).await.map_err(|e| {
            KeystoneError::Cache(format!("Failed to delete key '{}': {}", key, e))
        })?;

        debug!("Deleted key '{}': {}", key, deleted > 0);
        Ok(deleted > 0)
    }

    async fn exists_raw(&self, key: &str) -> KeystoneResult<bool> {
        if !self.is_enabled() {
            return Ok(false);
        }

        let mut conn = self.get_conn().await?;
        let exists: bool = conn.exists(key).await.map_err(|e| {
            KeystoneError::Cache(format!("Failed to check key '{}': {}", key, e))
        })?;

        Ok(exists)
    }
}
