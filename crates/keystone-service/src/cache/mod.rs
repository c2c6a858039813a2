//! Caching infrastructure for the service layer.
//!
//! Backends store raw JSON strings behind [`CacheInterface`]. Services use the
//! typed [`CacheExt`] facade, which never fails: every backend or
//! serialization error is logged and treated as a miss.

mod cache_interface;
pub mod cache_keys;
mod memory_cache;
mod noop_cache;
mod redis_cache;

pub use cache_interface::{CacheExt, CacheInterface};
pub use memory_cache::InMemoryCache;
pub use noop_cache::NoopCache;
pub use redis_cache::{RedisCacheService, RedisCacheServiceParameters, DEFAULT_TTL};

#[cfg(test)]
pub use cache_interface::MockCacheInterface;
