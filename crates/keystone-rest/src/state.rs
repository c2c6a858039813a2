//! Application state for Axum handlers.

use keystone_core::HealthRegistry;
use keystone_service::UserService;
use shaku::HasComponent;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<dyn UserService>,
    pub health: Arc<HealthRegistry>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(user_service: Arc<dyn UserService>, health: Arc<HealthRegistry>) -> Self {
        Self {
            user_service,
            health,
        }
    }

    /// Resolves the user service from a dependency-injection module.
    pub fn from_module<M>(module: &M, health: Arc<HealthRegistry>) -> Self
    where
        M: HasComponent<dyn UserService>,
    {
        Self {
            user_service: module.resolve(),
            health,
        }
    }
}
