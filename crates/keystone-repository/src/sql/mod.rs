//! SQL repository over MySQL or PostgreSQL.

mod dialect;
mod user_repository;

pub use dialect::{Dialect, Statement};
pub use user_repository::{SqlUserRepository, SqlUserRepositoryParameters};

use crate::{validate_columns, DatabasePool, DeletePolicy, Filter, Query, Repository, TableMapping};
use async_trait::async_trait;
use chrono::Utc;
use keystone_core::{EntityId, KeystoneError, KeystoneResult};
use keystone_resilience::RetryPolicy;
use sqlx::mysql::MySqlRow;
use sqlx::postgres::PgRow;
use sqlx::FromRow;
use std::future::Future;
use std::marker::PhantomData;
use tracing::debug;

/// Binds positional parameters onto any sqlx query builder.
macro_rules! bind_all {
    ($query:expr, $params:expr) => {{
        let mut query = $query;
        for value in $params {
            query = match value {
                $crate::ColumnValue::Int(v) => query.bind(v),
                $crate::ColumnValue::Text(v) => query.bind(v),
                $crate::ColumnValue::Bool(v) => query.bind(v),
                $crate::ColumnValue::Timestamp(v) => query.bind(v),
            };
        }
        query
    }};
}

enum FetchedRows {
    MySql(Vec<MySqlRow>),
    Postgres(Vec<PgRow>),
}

impl FetchedRows {
    fn decode<E: TableMapping>(self) -> KeystoneResult<Vec<E>> {
        match self {
            Self::MySql(rows) => rows
                .iter()
                .map(|row| E::from_row(<E::Row as FromRow<'_, MySqlRow>>::from_row(row)?))
                .collect(),
            Self::Postgres(rows) => rows
                .iter()
                .map(|row| E::from_row(<E::Row as FromRow<'_, PgRow>>::from_row(row)?))
                .collect(),
        }
    }
}

/// Repository generating SQL from an entity's [`TableMapping`].
///
/// Connectivity failures are retried with the configured policy; every
/// other store failure surfaces immediately.
pub struct SqlRepository<E: TableMapping> {
    pool: DatabasePool,
    delete_policy: DeletePolicy,
    retry: RetryPolicy,
    _entity: PhantomData<fn() -> E>,
}

impl<E: TableMapping> SqlRepository<E> {
    /// Creates a repository with hard deletes and the default retry policy.
    #[must_use]
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            pool,
            delete_policy: DeletePolicy::default(),
            retry: RetryPolicy::default(),
            _entity: PhantomData,
        }
    }

    /// Sets the delete policy.
    #[must_use]
    pub fn with_delete_policy(mut self, delete_policy: DeletePolicy) -> Self {
        self.delete_policy = delete_policy;
        self
    }

    /// Sets the retry policy for transient failures.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn dialect(&self) -> Dialect {
        self.pool.dialect()
    }

    async fn with_retry<T, F, Fut>(&self, op: F) -> KeystoneResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = KeystoneResult<T>>,
    {
        self.retry.execute_when(op, KeystoneError::is_transient).await
    }

    async fn fetch_rows(&self, statement: Statement) -> KeystoneResult<Vec<E>> {
        debug!(sql = %statement.sql, "Fetching {}", E::TABLE);
        let rows = self
            .with_retry(|| {
                let Statement { sql, params } = statement.clone();
                async move {
                    let rows = match &self.pool {
                        DatabasePool::MySql(pool) => FetchedRows::MySql(
                            bind_all!(sqlx::query(&sql), params).fetch_all(pool).await?,
                        ),
                        DatabasePool::Postgres(pool) => FetchedRows::Postgres(
                            bind_all!(sqlx::query(&sql), params).fetch_all(pool).await?,
                        ),
                    };
                    Ok::<_, KeystoneError>(rows)
                }
            })
            .await?;
        rows.decode()
    }

    async fn fetch_scalar(&self, statement: Statement) -> KeystoneResult<i64> {
        debug!(sql = %statement.sql, "Querying {}", E::TABLE);
        self.with_retry(|| {
            let Statement { sql, params } = statement.clone();
            async move {
                let value = match &self.pool {
                    DatabasePool::MySql(pool) => {
                        bind_all!(sqlx::query_scalar::<_, i64>(&sql), params)
                            .fetch_one(pool)
                            .await?
                    }
                    DatabasePool::Postgres(pool) => {
                        bind_all!(sqlx::query_scalar::<_, i64>(&sql), params)
                            .fetch_one(pool)
                            .await?
                    }
                };
                Ok::<_, KeystoneError>(value)
            }
        })
        .await
    }

    /// Executes a statement and returns the affected row count.
    async fn execute(&self, statement: Statement) -> KeystoneResult<u64> {
        debug!(sql = %statement.sql, "Executing on {}", E::TABLE);
        self.with_retry(|| {
            let Statement { sql, params } = statement.clone();
            async move {
                let affected = match &self.pool {
                    DatabasePool::MySql(pool) => bind_all!(sqlx::query(&sql), params)
                        .execute(pool)
                        .await?
                        .rows_affected(),
                    DatabasePool::Postgres(pool) => bind_all!(sqlx::query(&sql), params)
                        .execute(pool)
                        .await?
                        .rows_affected(),
                };
                Ok::<_, KeystoneError>(affected)
            }
        })
        .await
    }

    /// Inserts a row and returns the generated id.
    async fn insert(&self, statement: Statement) -> KeystoneResult<EntityId> {
        debug!(sql = %statement.sql, "Inserting into {}", E::TABLE);
        // Inserts are not retried: a lost acknowledgement could duplicate the row.
        let Statement { sql, params } = statement;
        let id = match &self.pool {
            DatabasePool::MySql(pool) => {
                let result = bind_all!(sqlx::query(&sql), params).execute(pool).await?;
                i64::try_from(result.last_insert_id()).map_err(|_| {
                    KeystoneError::internal(format!("Generated id out of range for {}", E::TABLE))
                })?
            }
            DatabasePool::Postgres(pool) => {
                bind_all!(sqlx::query_scalar::<_, i64>(&sql), params)
                    .fetch_one(pool)
                    .await?
            }
        };
        Ok(EntityId(id))
    }

    async fn reload(&self, id: EntityId) -> KeystoneResult<E> {
        self.get_by_id(id).await?.ok_or_else(|| {
            KeystoneError::internal(format!("{} {} vanished after write", E::RESOURCE, id))
        })
    }
}

#[async_trait]
impl<E: TableMapping> Repository<E> for SqlRepository<E> {
    async fn get_by_id(&self, id: EntityId) -> KeystoneResult<Option<E>> {
        let statement = self.dialect().select_by_id::<E>(id);
        Ok(self.fetch_rows(statement).await?.into_iter().next())
    }

    async fn get_all(&self) -> KeystoneResult<Vec<E>> {
        self.fetch(Query::new()).await
    }

    async fn add(&self, mut entity: E) -> KeystoneResult<E> {
        if entity.id().is_assigned() {
            return Err(KeystoneError::validation(format!(
                "Cannot add {} that already has id {}",
                E::RESOURCE,
                entity.id()
            )));
        }

        let record = entity.record_mut();
        record.created_at = Utc::now();
        record.updated_at = None;
        record.is_deleted = false;

        let id = self.insert(self.dialect().insert(&entity)).await?;
        debug!("Added {} {}", E::RESOURCE, id);
        self.reload(id).await
    }

    async fn update(&self, mut entity: E) -> KeystoneResult<E> {
        let id = entity.id();
        entity.record_mut().updated_at = Some(Utc::now());

        let affected = self.execute(self.dialect().update(&entity)).await?;
        // MySQL reports changed rows only, so zero can still mean a match.
        if affected == 0 && !self.exists(id).await? {
            return Err(KeystoneError::not_found(E::RESOURCE, id));
        }

        debug!("Updated {} {}", E::RESOURCE, id);
        self.reload(id).await
    }

    async fn delete(&self, id: EntityId) -> KeystoneResult<()> {
        let statement = match self.delete_policy {
            DeletePolicy::Hard => self.dialect().hard_delete::<E>(id),
            DeletePolicy::Soft => self.dialect().soft_delete::<E>(id, Utc::now()),
        };
        let affected = self.execute(statement).await?;
        debug!(
            "Deleted {} {} ({:?}, {} row(s))",
            E::RESOURCE,
            id,
            self.delete_policy,
            affected
        );
        Ok(())
    }

    async fn exists(&self, id: EntityId) -> KeystoneResult<bool> {
        let filter = Filter::new().eq("id", id);
        Ok(self.fetch_scalar(self.dialect().count::<E>(&filter)).await? > 0)
    }

    async fn fetch(&self, query: Query) -> KeystoneResult<Vec<E>> {
        validate_columns::<E>(query.columns())?;
        self.fetch_rows(self.dialect().select::<E>(&query)).await
    }

    async fn count(&self, filter: Filter) -> KeystoneResult<u64> {
        validate_columns::<E>(filter.conditions().iter().map(|c| c.column.as_str()))?;
        let count = self.fetch_scalar(self.dialect().count::<E>(&filter)).await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}
