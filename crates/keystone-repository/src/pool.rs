//! Database connection pool management.

use crate::sql::Dialect;
use async_trait::async_trait;
use keystone_config::{AppConfig, DatabaseConfig, DatabaseProvider};
use keystone_core::{HealthCheck, HealthStatus, KeystoneError, KeystoneResult, PersistenceKind};
use keystone_resilience::RetryPolicy;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, warn};

/// Provider-specific connection pool.
#[derive(Clone)]
pub enum DatabasePool {
    MySql(MySqlPool),
    Postgres(PgPool),
}

impl DatabasePool {
    /// Connects using the provider and connection string resolved from configuration.
    ///
    /// Connectivity failures are retried with exponential backoff.
    pub async fn connect(config: &AppConfig) -> KeystoneResult<Self> {
        let provider = config.database.provider()?;
        let url = config.resolve_connection_string()?;
        Self::connect_with(provider, &url, &config.database).await
    }

    /// Connects to an explicit provider and connection string.
    pub async fn connect_with(
        provider: DatabaseProvider,
        url: &str,
        config: &DatabaseConfig,
    ) -> KeystoneResult<Self> {
        info!("Connecting to {} database...", provider);

        let retry = RetryPolicy::with_max_attempts(config.retry_max_attempts)
            .initial_delay(config.retry_initial_delay());

        let pool = retry
            .execute_when(
                || async move {
                    let pool = match provider {
                        DatabaseProvider::MySql => Self::MySql(
                            MySqlPoolOptions::new()
                                .min_connections(config.min_connections)
                                .max_connections(config.max_connections)
                                .acquire_timeout(config.connect_timeout())
                                .idle_timeout(Some(config.idle_timeout()))
                                .connect(url)
                                .await?,
                        ),
                        DatabaseProvider::Postgres => Self::Postgres(
                            PgPoolOptions::new()
                                .min_connections(config.min_connections)
                                .max_connections(config.max_connections)
                                .acquire_timeout(config.connect_timeout())
                                .idle_timeout(Some(config.idle_timeout()))
                                .connect(url)
                                .await?,
                        ),
                    };
                    Ok::<_, KeystoneError>(pool)
                },
                KeystoneError::is_transient,
            )
            .await
            .map_err(|e| {
                warn!("Failed to connect to database: {}", e);
                e
            })?;

        info!("{} connection pool established", provider);
        Ok(pool)
    }

    /// Returns the provider behind this pool.
    #[must_use]
    pub const fn provider(&self) -> DatabaseProvider {
        match self {
            Self::MySql(_) => DatabaseProvider::MySql,
            Self::Postgres(_) => DatabaseProvider::Postgres,
        }
    }

    /// Returns the SQL dialect of this pool.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        match self {
            Self::MySql(_) => Dialect::MySql,
            Self::Postgres(_) => Dialect::Postgres,
        }
    }

    /// Checks if the database connection is healthy.
    pub async fn health_check(&self) -> KeystoneResult<()> {
        match self {
            Self::MySql(pool) => sqlx::query("SELECT 1").execute(pool).await.map(|_| ()),
            Self::Postgres(pool) => sqlx::query("SELECT 1").execute(pool).await.map(|_| ()),
        }
        .map_err(KeystoneError::from)
    }

    /// Runs the embedded migrations for this provider.
    pub async fn run_migrations(&self) -> KeystoneResult<()> {
        info!("Running {} database migrations...", self.provider());
        match self {
            Self::MySql(pool) => sqlx::migrate!("../../migrations/mysql").run(pool).await,
            Self::Postgres(pool) => sqlx::migrate!("../../migrations/postgres").run(pool).await,
        }
        .map_err(|e| {
            KeystoneError::persistence(PersistenceKind::Query, format!("Migration failed: {}", e))
        })?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Closes the database pool.
    pub async fn close(&self) {
        info!("Closing database connection pool...");
        match self {
            Self::MySql(pool) => pool.close().await,
            Self::Postgres(pool) => pool.close().await,
        }
        info!("Database connection pool closed");
    }
}

impl std::fmt::Debug for DatabasePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (size, num_idle) = match self {
            Self::MySql(pool) => (pool.size(), pool.num_idle()),
            Self::Postgres(pool) => (pool.size(), pool.num_idle()),
        };
        f.debug_struct("DatabasePool")
            .field("provider", &self.provider())
            .field("size", &size)
            .field("num_idle", &num_idle)
            .finish()
    }
}

/// Readiness probe running `SELECT 1` against the pool.
pub struct DatabaseHealthCheck {
    pool: DatabasePool,
}

impl DatabaseHealthCheck {
    #[must_use]
    pub const fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthCheck for DatabaseHealthCheck {
    fn name(&self) -> &str {
        "database"
    }

    async fn check(&self) -> HealthStatus {
        match self.pool.health_check().await {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        }
    }
}
