//! User management controller.

use crate::{
    extractors::ValidatedJson,
    responses::{ok, ApiResult, AppError},
    state::AppState,
};
use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use keystone_core::{Entity, EntityId, KeystoneError, User};
use keystone_service::{CreateUserRequest, Service, UserDto, UserService};
use tracing::debug;

/// Creates the user router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).delete(delete_user))
}

/// List all users.
async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<UserDto>> {
    debug!("List users request");

    let users = state.user_service.get_all().await?;
    ok(users.into_iter().map(UserDto::from).collect())
}

/// Create a new user.
async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> ApiResult<UserDto> {
    debug!("Create user request: {}", request.username);

    let user = state.user_service.create_user(request).await?;
    ok(user)
}

/// Get a user by ID.
async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<UserDto> {
    debug!("Get user request: {}", id);

    let user_id = parse_user_id(&id)?;
    let user = state
        .user_service
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| KeystoneError::not_found(User::RESOURCE, user_id))?;

    ok(UserDto::from(user))
}

/// Delete a user. Deleting a missing user succeeds.
async fn delete_user(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    debug!("Delete user request: {}", id);

    let user_id = parse_user_id(&id)?;
    state.user_service.delete(user_id).await?;

    ok(())
}

/// Parse a user ID from a path segment.
fn parse_user_id(id: &str) -> Result<EntityId, AppError> {
    id.parse::<EntityId>()
        .map_err(|_| AppError(KeystoneError::validation(format!("Invalid user ID: {}", id))))
}
