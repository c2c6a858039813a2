//! End-to-end tests of the REST surface over in-memory stores.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    routing::get,
    Router,
};
use http_body_util::BodyExt;
use keystone_config::ServerConfig;
use keystone_core::{HealthCheck, HealthRegistry, HealthStatus, User};
use keystone_repository::{InMemoryRepository, Repository};
use keystone_rest::{responses::panic_response, router_with_state, AppState};
use keystone_security::PasswordHasher;
use keystone_service::{UserService, UserServiceImpl};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;

struct StaticCheck(HealthStatus);

#[async_trait]
impl HealthCheck for StaticCheck {
    fn name(&self) -> &str {
        "database"
    }

    async fn check(&self) -> HealthStatus {
        self.0.clone()
    }
}

fn app_with_health(status: HealthStatus) -> Router {
    let repository: Arc<dyn Repository<User>> = Arc::new(InMemoryRepository::<User>::new());
    let user_service: Arc<dyn UserService> = Arc::new(UserServiceImpl::new(
        repository,
        Arc::new(PasswordHasher::fast()),
    ));
    let health = HealthRegistry::new().with_check(Arc::new(StaticCheck(status)));

    router_with_state(
        AppState::new(user_service, Arc::new(health)),
        &ServerConfig::default(),
    )
}

fn app() -> Router {
    app_with_health(HealthStatus::Healthy)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_user(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn alice() -> Value {
    json!({"username": "alice", "email": "alice@x.com", "password": "secret1"})
}

#[tokio::test]
async fn create_user_returns_success_envelope() {
    let app = app();

    let (status, body) = send(&app, post_user(alice())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Success");
    assert_eq!(body["data"]["id"], 1);
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["email"], "alice@x.com");
    assert_eq!(body["data"]["isActive"], false);
    assert!(body["data"]["createdAt"].is_string());
    assert!(body["data"].get("passwordHash").is_none());
}

#[tokio::test]
async fn duplicate_email_is_conflict() {
    let app = app();
    send(&app, post_user(alice())).await;

    let (status, body) = send(&app, post_user(alice())).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body,
        json!({"success": false, "data": null, "message": "Email already exists"})
    );
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let app = app();

    let (status, body) = send(&app, get_request("/api/v1/users/999")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({"success": false, "data": null, "message": "Resource not found"})
    );
}

#[tokio::test]
async fn malformed_id_is_bad_request() {
    let app = app();

    let (status, body) = send(&app, get_request("/api/v1/users/abc")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn invalid_request_is_bad_request() {
    let app = app();

    let (status, body) = send(
        &app,
        post_user(json!({"username": "alice", "email": "nope", "password": "secret1"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "email: Invalid email address");
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{oops"))
        .unwrap();

    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn list_get_and_delete_round() {
    let app = app();
    send(&app, post_user(alice())).await;
    send(
        &app,
        post_user(json!({"username": "bob", "email": "bob@x.com", "password": "secret2"})),
    )
    .await;

    let (status, body) = send(&app, get_request("/api/v1/users")).await;
    assert_eq!(status, StatusCode::OK);
    let users = body["data"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0]["username"], "alice");
    assert_eq!(users[1]["username"], "bob");

    let (status, body) = send(&app, get_request("/api/v1/users/2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "bob@x.com");

    let (status, body) = send(&app, delete_request("/api/v1/users/2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "data": null, "message": "Success"}));

    let (status, _) = send(&app, get_request("/api/v1/users/2")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Deleting again is not an error
    let (status, _) = send(&app, delete_request("/api/v1/users/2")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn health_endpoints() {
    let app = app();

    let (status, body) = send(&app, get_request("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, get_request("/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"][0]["name"], "database");

    let (status, _) = send(&app, get_request("/live")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unhealthy_dependency_is_not_ready() {
    let app = app_with_health(HealthStatus::Unhealthy("connection refused".to_string()));

    let (status, body) = send(&app, get_request("/ready")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "not_ready");
    assert_eq!(body["checks"][0]["detail"], "connection refused");
}

#[tokio::test]
async fn handler_panic_is_generic_500() {
    async fn boom() -> &'static str {
        panic!("secret internal detail")
    }

    let app = Router::new()
        .route("/boom", get(boom))
        .layer(CatchPanicLayer::custom(panic_response));

    let (status, body) = send(&app, get_request("/boom")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"success": false, "data": null, "message": "An unexpected error occurred"})
    );
}
