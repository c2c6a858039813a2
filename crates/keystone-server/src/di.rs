//! Dependency injection module using Shaku.
//!
//! [`AppModule`] registers one shared instance of every component. Components
//! that need outbound connections get their parameters from
//! [`build_application`]; tests swap them with in-memory overrides.

use keystone_config::AppConfig;
use keystone_core::{HealthRegistry, KeystoneResult, User};
use keystone_repository::{
    DatabaseHealthCheck, DatabasePool, DeletePolicy, SqlRepository, SqlUserRepository,
};
use keystone_resilience::RetryPolicy;
use keystone_security::PasswordHasher;
use keystone_service::{RedisCacheService, UserServiceImpl};
use shaku::module;
use std::sync::Arc;
use tracing::info;

// Single-process deployment: SQL persistence, Redis caching, Argon2
// hashing and the user service.
module! {
    pub AppModule {
        components = [
            SqlUserRepository,
            RedisCacheService,
            PasswordHasher,
            UserServiceImpl,
        ],
        providers = [],
    }
}

/// Wired module together with the resources it does not own.
pub struct Application {
    module: Arc<AppModule>,
    database_pool: DatabasePool,
    health: Arc<HealthRegistry>,
}

impl Application {
    #[must_use]
    pub fn module(&self) -> &AppModule {
        &self.module
    }

    /// Readiness checks for every outbound dependency startup requires.
    #[must_use]
    pub fn health(&self) -> Arc<HealthRegistry> {
        Arc::clone(&self.health)
    }

    /// Releases pooled resources.
    pub async fn shutdown(&self) {
        self.database_pool.close().await;
        info!("Database pool closed");
    }
}

/// Connects every outbound dependency described by `config` and builds the
/// module.
///
/// An unsupported provider or unreachable database fails startup; an
/// unreachable Redis does not.
pub async fn build_application(config: &AppConfig) -> KeystoneResult<Application> {
    let pool = DatabasePool::connect(config).await?;
    info!("Connected to {} database", pool.provider());

    if config.database.run_migrations {
        pool.run_migrations().await?;
    }

    let retry_policy = RetryPolicy::with_max_attempts(config.database.retry_max_attempts)
        .initial_delay(config.database.retry_initial_delay());
    let user_repository = SqlRepository::<User>::new(pool.clone())
        .with_delete_policy(DeletePolicy::from_soft_delete(config.database.soft_delete))
        .with_retry_policy(retry_policy);

    let module = AppModule::builder()
        .with_component_parameters::<SqlUserRepository>(SqlUserRepository::parameters(
            user_repository,
        ))
        .with_component_parameters::<RedisCacheService>(
            RedisCacheService::connect(&config.redis).into_parameters(),
        )
        .with_component_parameters::<PasswordHasher>(PasswordHasher::new().into_parameters())
        .with_component_parameters::<UserServiceImpl>(UserServiceImpl::parameters(Some(
            config.redis.default_ttl(),
        )))
        .build();

    let health = HealthRegistry::new().with_check(Arc::new(DatabaseHealthCheck::new(pool.clone())));

    Ok(Application {
        module: Arc::new(module),
        database_pool: pool,
        health: Arc::new(health),
    })
}
