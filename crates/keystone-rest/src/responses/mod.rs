//! API response types and the error translation boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use keystone_core::KeystoneError;
use serde::{Deserialize, Serialize};
use std::any::Any;
use tracing::{debug, error};

/// Message carried by every successful envelope.
pub const SUCCESS_MESSAGE: &str = "Success";

/// Standard API response wrapper.
///
/// `data` is always serialized, as `null` on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: String,
}

impl<T> ApiResponse<T> {
    /// Creates a successful response.
    pub fn success(data: T) -> Self {
        Self::success_with_message(data, SUCCESS_MESSAGE)
    }

    /// Creates a successful response with a custom message.
    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
        }
    }

    /// Creates a failure response.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: message.into(),
        }
    }
}

/// Application error type for Axum.
///
/// The only place a [`KeystoneError`] becomes a status code and envelope.
#[derive(Debug)]
pub struct AppError(pub KeystoneError);

impl From<KeystoneError> for AppError {
    fn from(err: KeystoneError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if err.is_expected() {
            debug!(code = err.error_code(), status = status.as_u16(), "{}", err);
        } else {
            error!(code = err.error_code(), status = status.as_u16(), error = ?err, "Request failed: {}", err);
        }

        let body = Json(ApiResponse::<()>::failure(err.public_message()));
        (status, body).into_response()
    }
}

/// Renders a handler panic as a sanitized 500 envelope.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");

    AppError(KeystoneError::internal(format!("Handler panicked: {}", detail))).into_response()
}

/// Result type for Axum handlers.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

/// Helper to create a success response.
pub fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}
