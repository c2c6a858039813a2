//! Core traits shared by every layer.

use crate::EntityId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Bookkeeping fields carried by every persisted entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Store-assigned identity.
    pub id: EntityId,

    /// Stamped once at insert.
    pub created_at: DateTime<Utc>,

    /// `None` until the first mutation.
    pub updated_at: Option<DateTime<Utc>>,

    /// Soft-delete flag.
    pub is_deleted: bool,
}

impl Record {
    /// Creates the record of an entity that has not been persisted yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: EntityId::UNASSIGNED,
            created_at: Utc::now(),
            updated_at: None,
            is_deleted: false,
        }
    }

    /// Marks the record as modified now.
    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

/// Capability trait implemented by every persisted type.
///
/// Repositories, services and caches are generic over this trait.
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Resource name used in cache keys and not-found errors.
    const RESOURCE: &'static str;

    /// Returns the shared bookkeeping fields.
    fn record(&self) -> &Record;

    /// Returns the shared bookkeeping fields mutably.
    fn record_mut(&mut self) -> &mut Record;

    /// Returns the entity's identity.
    fn id(&self) -> EntityId {
        self.record().id
    }

    /// Sets the entity's identity.
    fn set_id(&mut self, id: EntityId) {
        self.record_mut().id = id;
    }

    /// Returns true if the entity is flagged as deleted.
    fn is_deleted(&self) -> bool {
        self.record().is_deleted
    }
}

/// Trait for health checks.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Returns the name of this health check.
    fn name(&self) -> &str;

    /// Performs the health check.
    async fn check(&self) -> HealthStatus;
}

/// Health check status.
#[derive(Debug, Clone)]
pub enum HealthStatus {
    /// The component is healthy.
    Healthy,
    /// The component is degraded but functional.
    Degraded(String),
    /// The component is unhealthy.
    Unhealthy(String),
}

impl HealthStatus {
    /// Returns true if the status is healthy.
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// Returns true if the status is unhealthy.
    #[must_use]
    pub const fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}

/// Named set of health checks run together for readiness.
#[derive(Clone, Default)]
pub struct HealthRegistry {
    checks: Vec<Arc<dyn HealthCheck>>,
}

impl HealthRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a check.
    #[must_use]
    pub fn with_check(mut self, check: Arc<dyn HealthCheck>) -> Self {
        self.checks.push(check);
        self
    }

    /// Returns the registered checks.
    #[must_use]
    pub fn checks(&self) -> &[Arc<dyn HealthCheck>] {
        &self.checks
    }

    /// Runs every check in registration order.
    pub async fn run(&self) -> Vec<(String, HealthStatus)> {
        let mut results = Vec::with_capacity(self.checks.len());
        for check in &self.checks {
            results.push((check.name().to_string(), check.check().await));
        }
        results
    }
}

impl std::fmt::Debug for HealthRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.checks.iter().map(|c| c.name()).collect();
        f.debug_struct("HealthRegistry").field("checks", &names).finish()
    }
}
