//! Generic CRUD service with cache-aside caching.

use crate::cache::{cache_keys, CacheExt, CacheInterface, NoopCache, DEFAULT_TTL};
use async_trait::async_trait;
use keystone_core::{Entity, EntityId, KeystoneResult};
use keystone_repository::Repository;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Generic service contract for one entity type.
#[async_trait]
pub trait Service<E: Entity>: Send + Sync {
    /// Gets an entity by ID. Absence is `Ok(None)`.
    async fn get_by_id(&self, id: EntityId) -> KeystoneResult<Option<E>>;

    /// Lists all entities ordered by ID.
    async fn get_all(&self) -> KeystoneResult<Vec<E>>;

    /// Creates an entity and returns its stored form.
    async fn create(&self, entity: E) -> KeystoneResult<E>;

    /// Persists changes of an existing entity.
    async fn update(&self, entity: E) -> KeystoneResult<()>;

    /// Deletes an entity. Deleting a missing ID is not an error.
    async fn delete(&self, id: EntityId) -> KeystoneResult<()>;

    /// Checks if an entity exists.
    async fn exists(&self, id: EntityId) -> KeystoneResult<bool>;
}

/// Reusable [`Service`] implementation over a repository and a cache.
///
/// Reads by ID consult the cache first and populate it on a miss. Creates
/// and updates write the stored form after the write succeeds; deletes
/// remove the key after the delete. Repository failures propagate
/// unchanged; cache failures never surface.
pub struct CrudService<E: Entity> {
    repository: Arc<dyn Repository<E>>,
    cache: Arc<dyn CacheInterface>,
    ttl: Option<Duration>,
}

impl<E: Entity> CrudService<E> {
    /// Creates a service without caching.
    #[must_use]
    pub fn new(repository: Arc<dyn Repository<E>>) -> Self {
        Self {
            repository,
            cache: Arc::new(NoopCache),
            ttl: Some(DEFAULT_TTL),
        }
    }

    /// Uses `cache` with entries expiring after `ttl` (`None` never expires).
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn CacheInterface>, ttl: Option<Duration>) -> Self {
        self.cache = cache;
        self.ttl = ttl;
        self
    }

    /// Returns the underlying repository.
    #[must_use]
    pub fn repository(&self) -> &Arc<dyn Repository<E>> {
        &self.repository
    }

    /// Returns the cache backend.
    #[must_use]
    pub fn cache(&self) -> &Arc<dyn CacheInterface> {
        &self.cache
    }

    async fn remember(&self, entity: &E) {
        let key = cache_keys::entity_by_id::<E>(entity.id());
        self.cache.set(&key, entity, self.ttl).await;
    }
}

impl<E: Entity> Clone for CrudService<E> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            cache: Arc::clone(&self.cache),
            ttl: self.ttl,
        }
    }
}

#[async_trait]
impl<E: Entity> Service<E> for CrudService<E> {
    async fn get_by_id(&self, id: EntityId) -> KeystoneResult<Option<E>> {
        let key = cache_keys::entity_by_id::<E>(id);

        if let Some(cached) = self.cache.get::<E>(&key).await {
            if !cached.is_deleted() {
                return Ok(Some(cached));
            }
        }

        let entity = self.repository.get_by_id(id).await?;
        if let Some(entity) = &entity {
            self.remember(entity).await;
        }

        Ok(entity)
    }

    async fn get_all(&self) -> KeystoneResult<Vec<E>> {
        self.repository.get_all().await
    }

    async fn create(&self, entity: E) -> KeystoneResult<E> {
        let stored = self.repository.add(entity).await?;
        debug!("Created {} {}", E::RESOURCE, stored.id());
        self.remember(&stored).await;
        Ok(stored)
    }

    async fn update(&self, entity: E) -> KeystoneResult<()> {
        let stored = self.repository.update(entity).await?;
        debug!("Updated {} {}", E::RESOURCE, stored.id());
        self.remember(&stored).await;
        Ok(())
    }

    async fn delete(&self, id: EntityId) -> KeystoneResult<()> {
        self.repository.delete(id).await?;
        self.cache.remove(&cache_keys::entity_by_id::<E>(id)).await;
        debug!("Deleted {} {}", E::RESOURCE, id);
        Ok(())
    }

    async fn exists(&self, id: EntityId) -> KeystoneResult<bool> {
        self.repository.exists(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{InMemoryCache, MockCacheInterface};
    use keystone_core::{KeystoneError, User};
    use keystone_repository::InMemoryRepository;

    fn cached_service() -> (CrudService<User>, Arc<InMemoryRepository<User>>, Arc<InMemoryCache>) {
        let repository = Arc::new(InMemoryRepository::<User>::new());
        let cache = Arc::new(InMemoryCache::new());
        let service = CrudService::new(repository.clone() as Arc<dyn Repository<User>>)
            .with_cache(cache.clone(), Some(Duration::from_secs(60)));
        (service, repository, cache)
    }

    #[tokio::test]
    async fn test_created_entity_is_returned_by_get_by_id() {
        let (service, _, _) = cached_service();

        let created = service
            .create(User::new("alice", "alice@x.com", "hash"))
            .await
            .unwrap();

        assert!(created.id().is_assigned());
        assert_eq!(service.get_by_id(created.id()).await.unwrap(), Some(created));
    }

    #[tokio::test]
    async fn test_create_populates_cache() {
        let (service, _, cache) = cached_service();

        let created = service
            .create(User::new("alice", "alice@x.com", "hash"))
            .await
            .unwrap();

        let key = cache_keys::entity_by_id::<User>(created.id());
        assert_eq!(cache.get::<User>(&key).await, Some(created));
    }

    #[tokio::test]
    async fn test_get_by_id_serves_from_cache() {
        let (service, repository, _) = cached_service();
        let created = service
            .create(User::new("alice", "alice@x.com", "hash"))
            .await
            .unwrap();

        // Change the store behind the service's back; the cached copy wins.
        let mut changed = created.clone();
        changed.username = "renamed".to_string();
        repository.update(changed).await.unwrap();

        let fetched = service.get_by_id(created.id()).await.unwrap().unwrap();
        assert_eq!(fetched.username, "alice");
    }

    #[tokio::test]
    async fn test_update_refreshes_cache() {
        let (service, _, cache) = cached_service();
        let mut user = service
            .create(User::new("alice", "alice@x.com", "hash"))
            .await
            .unwrap();

        user.activate();
        service.update(user.clone()).await.unwrap();

        let key = cache_keys::entity_by_id::<User>(user.id());
        let cached = cache.get::<User>(&key).await.unwrap();
        assert!(cached.is_active);
        assert!(cached.record.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_update_missing_entity_is_not_found() {
        let (service, _, _) = cached_service();
        let mut ghost = User::new("ghost", "ghost@x.com", "hash");
        ghost.set_id(EntityId::new(99));

        let err = service.update(ghost).await.unwrap_err();
        assert!(matches!(err, KeystoneError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_evicts_and_is_idempotent() {
        let (service, _, cache) = cached_service();
        let created = service
            .create(User::new("alice", "alice@x.com", "hash"))
            .await
            .unwrap();

        service.delete(created.id()).await.unwrap();

        assert!(!service.exists(created.id()).await.unwrap());
        assert_eq!(service.get_by_id(created.id()).await.unwrap(), None);
        assert!(!cache.exists(&cache_keys::entity_by_id::<User>(created.id())).await);

        service.delete(created.id()).await.unwrap();
        service.delete(EntityId::new(12345)).await.unwrap();
    }

    #[tokio::test]
    async fn test_failing_cache_never_surfaces() {
        let mut cache = MockCacheInterface::new();
        cache
            .expect_get_raw()
            .returning(|_| Err(KeystoneError::Cache("down".to_string())));
        cache
            .expect_set_raw()
            .returning(|_, _, _| Err(KeystoneError::Cache("down".to_string())));
        cache
            .expect_delete_raw()
            .returning(|_| Err(KeystoneError::Cache("down".to_string())));

        let repository = Arc::new(InMemoryRepository::<User>::new());
        let service = CrudService::new(repository as Arc<dyn Repository<User>>)
            .with_cache(Arc::new(cache), None);

        let created = service
            .create(User::new("alice", "alice@x.com", "hash"))
            .await
            .unwrap();
        assert_eq!(
            service.get_by_id(created.id()).await.unwrap(),
            Some(created.clone())
        );
        service.delete(created.id()).await.unwrap();
        assert_eq!(service.get_all().await.unwrap(), Vec::<User>::new());
    }

    #[tokio::test]
    async fn test_behaves_identically_without_cache() {
        let repository = Arc::new(InMemoryRepository::<User>::new());
        let service = CrudService::new(repository as Arc<dyn Repository<User>>);

        let first = service
            .create(User::new("alice", "alice@x.com", "hash"))
            .await
            .unwrap();
        let second = service
            .create(User::new("bob", "bob@x.com", "hash"))
            .await
            .unwrap();

        let all = service.get_all().await.unwrap();
        assert_eq!(all, vec![first.clone(), second]);
        assert_eq!(service.get_by_id(first.id()).await.unwrap(), Some(first));
    }
}
