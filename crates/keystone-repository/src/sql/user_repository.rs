//! User repository registered in the application module.

use super::SqlRepository;
use crate::{Filter, Query, Repository};
use async_trait::async_trait;
use keystone_core::{EntityId, KeystoneResult, User};
use shaku::Component;

/// SQL-backed `Repository<User>` component.
#[derive(Component)]
#[shaku(interface = Repository<User>)]
pub struct SqlUserRepository {
    inner: SqlRepository<User>,
}

impl SqlUserRepository {
    #[must_use]
    pub fn new(inner: SqlRepository<User>) -> Self {
        Self { inner }
    }

    /// Module parameters wrapping a configured SQL repository.
    #[must_use]
    pub fn parameters(inner: SqlRepository<User>) -> SqlUserRepositoryParameters {
        SqlUserRepositoryParameters { inner }
    }
}

#[async_trait]
impl Repository<User> for SqlUserRepository {
    async fn get_by_id(&self, id: EntityId) -> KeystoneResult<Option<User>> {
        self.inner.get_by_id(id).await
    }

    async fn get_all(&self) -> KeystoneResult<Vec<User>> {
        self.inner.get_all().await
    }

    async fn add(&self, entity: User) -> KeystoneResult<User> {
        self.inner.add(entity).await
    }

    async fn update(&self, entity: User) -> KeystoneResult<User> {
        self.inner.update(entity).await
    }

    async fn delete(&self, id: EntityId) -> KeystoneResult<()> {
        self.inner.delete(id).await
    }

    async fn exists(&self, id: EntityId) -> KeystoneResult<bool> {
        self.inner.exists(id).await
    }

    async fn fetch(&self, query: Query) -> KeystoneResult<Vec<User>> {
        self.inner.fetch(query).await
    }

    async fn count(&self, filter: Filter) -> KeystoneResult<u64> {
        self.inner.count(filter).await
    }
}
