//! Repository trait definitions.

use crate::{ColumnValue, Filter, Op, OrderBy, Query, SortDirection};
use async_trait::async_trait;
use keystone_core::{Entity, EntityId, Interface, KeystoneResult};

/// Generic persistence contract for one entity type.
///
/// Absence is never an error for reads. Every mutation commits immediately.
/// Store failures surface as `KeystoneError::Persistence` and are never
/// turned into business errors here.
#[async_trait]
pub trait Repository<E: Entity>: Interface + Send + Sync {
    /// Finds a non-deleted entity by its ID.
    async fn get_by_id(&self, id: EntityId) -> KeystoneResult<Option<E>>;

    /// Returns all non-deleted entities ordered by ID.
    async fn get_all(&self) -> KeystoneResult<Vec<E>>;

    /// Inserts a new entity and returns its stored form.
    ///
    /// Fails with a validation error if the entity already carries an ID.
    async fn add(&self, entity: E) -> KeystoneResult<E>;

    /// Persists changes of an existing entity and returns its stored form.
    ///
    /// Fails with not-found if no non-deleted row has the entity's ID.
    async fn update(&self, entity: E) -> KeystoneResult<E>;

    /// Deletes an entity. Deleting a missing ID is not an error.
    async fn delete(&self, id: EntityId) -> KeystoneResult<()>;

    /// Checks if a non-deleted entity exists.
    async fn exists(&self, id: EntityId) -> KeystoneResult<bool>;

    /// Runs a query over non-deleted entities.
    async fn fetch(&self, query: Query) -> KeystoneResult<Vec<E>>;

    /// Counts non-deleted entities matching a filter.
    async fn count(&self, filter: Filter) -> KeystoneResult<u64>;

    /// Finds non-deleted entities matching a filter.
    async fn find(&self, filter: Filter) -> KeystoneResult<Vec<E>> {
        self.fetch(Query::from(filter)).await
    }
}

impl<'a, E: Entity> dyn Repository<E> + 'a {
    /// Starts a composable query against this repository.
    pub fn query(&self) -> EntityQuery<'_, E> {
        EntityQuery {
            repository: self,
            query: Query::new(),
        }
    }
}

/// Composable query handle returned by `Repository::query`.
pub struct EntityQuery<'r, E: Entity> {
    repository: &'r dyn Repository<E>,
    query: Query,
}

impl<'r, E: Entity> EntityQuery<'r, E> {
    /// Adds a condition.
    #[must_use]
    pub fn filter(mut self, column: &str, op: Op, value: impl Into<ColumnValue>) -> Self {
        self.query.filter = self.query.filter.and(column, op, value);
        self
    }

    /// Adds every condition of a filter.
    #[must_use]
    pub fn matching(mut self, filter: Filter) -> Self {
        self.query.filter = self.query.filter.merge(filter);
        self
    }

    /// Adds an equality condition.
    #[must_use]
    pub fn eq(self, column: &str, value: impl Into<ColumnValue>) -> Self {
        self.filter(column, Op::Eq, value)
    }

    /// Adds a case-insensitive text equality condition.
    #[must_use]
    pub fn eq_ignore_case(self, column: &str, value: impl Into<String>) -> Self {
        self.filter(column, Op::EqIgnoreCase, ColumnValue::Text(value.into()))
    }

    /// Adds an ordering term.
    #[must_use]
    pub fn order_by(mut self, column: &str, direction: SortDirection) -> Self {
        self.query.order_by.push(OrderBy {
            column: column.to_string(),
            direction,
        });
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.query.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.query.offset = Some(offset);
        self
    }

    /// Returns the accumulated query.
    #[must_use]
    pub fn into_query(self) -> Query {
        self.query
    }

    /// Runs the query and returns every match.
    pub async fn fetch_all(self) -> KeystoneResult<Vec<E>> {
        self.repository.fetch(self.query).await
    }

    /// Runs the query and returns the first match.
    pub async fn fetch_optional(mut self) -> KeystoneResult<Option<E>> {
        self.query.limit = Some(1);
        Ok(self.repository.fetch(self.query).await?.into_iter().next())
    }

    /// Counts matches of the query's filter. Ordering and paging are ignored.
    pub async fn count(self) -> KeystoneResult<u64> {
        self.repository.count(self.query.filter).await
    }
}
