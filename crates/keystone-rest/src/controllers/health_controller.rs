//! Health check controller.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use keystone_core::HealthStatus;
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status.
    pub status: String,
    /// Application version.
    pub version: String,
}

/// Outcome of one readiness check.
#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Readiness response.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub checks: Vec<CheckResult>,
}

/// Creates the health router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/live", get(liveness_check))
}

/// Health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check endpoint. Any unhealthy dependency answers 503.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let checks: Vec<CheckResult> = state
        .health
        .run()
        .await
        .into_iter()
        .map(|(name, status)| match status {
            HealthStatus::Healthy => CheckResult {
                name,
                status: "healthy",
                detail: None,
            },
            HealthStatus::Degraded(detail) => CheckResult {
                name,
                status: "degraded",
                detail: Some(detail),
            },
            HealthStatus::Unhealthy(detail) => CheckResult {
                name,
                status: "unhealthy",
                detail: Some(detail),
            },
        })
        .collect();

    let ready = checks.iter().all(|check| check.status != "unhealthy");
    let (code, status) = if ready {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not_ready")
    };

    (code, Json(ReadinessResponse { status, checks }))
}

/// Liveness check endpoint.
pub async fn liveness_check() -> impl IntoResponse {
    StatusCode::OK
}
