//! In-memory repository.
//!
//! Implements the same contract as the SQL repository over a locked map.
//! Used by tests and for running the service without a database.

use crate::{validate_columns, DeletePolicy, Filter, Query, Repository, SortDirection, TableMapping};
use async_trait::async_trait;
use chrono::Utc;
use keystone_core::{EntityId, KeystoneError, KeystoneResult};
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};
use tracing::debug;

/// Repository holding entities in memory.
pub struct InMemoryRepository<E: TableMapping> {
    rows: RwLock<BTreeMap<i64, E>>,
    sequence: AtomicI64,
    delete_policy: DeletePolicy,
}

impl<E: TableMapping> InMemoryRepository<E> {
    /// Creates an empty repository with hard deletes.
    #[must_use]
    pub fn new() -> Self {
        Self::with_delete_policy(DeletePolicy::Hard)
    }

    /// Creates an empty repository with the given delete policy.
    #[must_use]
    pub fn with_delete_policy(delete_policy: DeletePolicy) -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            sequence: AtomicI64::new(0),
            delete_policy,
        }
    }

    /// Number of stored rows, soft-deleted ones included.
    #[must_use]
    pub fn stored_rows(&self) -> usize {
        self.rows.read().len()
    }

    fn visible(&self, filter: &Filter) -> Vec<E> {
        self.rows
            .read()
            .values()
            .filter(|e| !e.is_deleted() && filter.matches(|column| e.value_of(column)))
            .cloned()
            .collect()
    }
}

impl<E: TableMapping> Default for InMemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: TableMapping> Repository<E> for InMemoryRepository<E> {
    async fn get_by_id(&self, id: EntityId) -> KeystoneResult<Option<E>> {
        Ok(self
            .rows
            .read()
            .get(&id.into_inner())
            .filter(|e| !e.is_deleted())
            .cloned())
    }

    async fn get_all(&self) -> KeystoneResult<Vec<E>> {
        Ok(self.visible(&Filter::new()))
    }

    async fn add(&self, mut entity: E) -> KeystoneResult<E> {
        if entity.id().is_assigned() {
            return Err(KeystoneError::validation(format!(
                "Cannot add {} that already has id {}",
                E::RESOURCE,
                entity.id()
            )));
        }

        let id = self.sequence.fetch_add(1, AtomicOrdering::SeqCst) + 1;
        let record = entity.record_mut();
        record.id = EntityId(id);
        record.created_at = Utc::now();
        record.updated_at = None;
        record.is_deleted = false;

        self.rows.write().insert(id, entity.clone());
        debug!("Added {} {}", E::RESOURCE, id);
        Ok(entity)
    }

    async fn update(&self, mut entity: E) -> KeystoneResult<E> {
        let id = entity.id();
        let mut rows = self.rows.write();
        let stored = rows
            .get_mut(&id.into_inner())
            .filter(|e| !e.is_deleted())
            .ok_or_else(|| KeystoneError::not_found(E::RESOURCE, id))?;

        let record = entity.record_mut();
        record.created_at = stored.record().created_at;
        record.is_deleted = false;
        record.updated_at = Some(Utc::now());

        *stored = entity.clone();
        debug!("Updated {} {}", E::RESOURCE, id);
        Ok(entity)
    }

    async fn delete(&self, id: EntityId) -> KeystoneResult<()> {
        let mut rows = self.rows.write();
        match self.delete_policy {
            DeletePolicy::Hard => {
                rows.remove(&id.into_inner());
            }
            DeletePolicy::Soft => {
                if let Some(stored) = rows.get_mut(&id.into_inner()).filter(|e| !e.is_deleted()) {
                    let record = stored.record_mut();
                    record.is_deleted = true;
                    record.updated_at = Some(Utc::now());
                }
            }
        }
        debug!("Deleted {} {} ({:?})", E::RESOURCE, id, self.delete_policy);
        Ok(())
    }

    async fn exists(&self, id: EntityId) -> KeystoneResult<bool> {
        Ok(self
            .rows
            .read()
            .get(&id.into_inner())
            .is_some_and(|e| !e.is_deleted()))
    }

    async fn fetch(&self, query: Query) -> KeystoneResult<Vec<E>> {
        validate_columns::<E>(query.columns())?;

        let mut matches = self.visible(&query.filter);
        if !query.order_by.is_empty() {
            // BTreeMap order is by id, which breaks ties.
            matches.sort_by(|a, b| {
                query
                    .order_by
                    .iter()
                    .map(|term| {
                        let ordering = match (a.value_of(&term.column), b.value_of(&term.column)) {
                            (Some(x), Some(y)) => x.compare(&y).unwrap_or(Ordering::Equal),
                            _ => Ordering::Equal,
                        };
                        match term.direction {
                            SortDirection::Asc => ordering,
                            SortDirection::Desc => ordering.reverse(),
                        }
                    })
                    .find(|o| *o != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }

        let offset = usize::try_from(query.offset.unwrap_or(0)).unwrap_or(usize::MAX);
        let limit = query
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
        Ok(matches.into_iter().skip(offset).take(limit).collect())
    }

    async fn count(&self, filter: Filter) -> KeystoneResult<u64> {
        validate_columns::<E>(filter.conditions().iter().map(|c| c.column.as_str()))?;
        Ok(self.visible(&filter).len() as u64)
    }
}
