//! Unified error types for all layers of the application.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display};
use thiserror::Error;

/// Message sent outward for any failure whose details must stay internal.
pub const GENERIC_FAILURE_MESSAGE: &str = "An unexpected error occurred";

/// Message sent outward when a requested resource does not exist.
pub const NOT_FOUND_MESSAGE: &str = "Resource not found";

/// Classification of persistence-layer failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceKind {
    /// The store could not be reached (I/O, TLS, pool exhaustion).
    Connectivity,
    /// A unique, foreign-key or check constraint rejected the write.
    ConstraintViolation,
    /// A row could not be decoded into its Rust representation.
    Decode,
    /// Any other statement failure.
    Query,
}

impl Display for PersistenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connectivity => "connectivity",
            Self::ConstraintViolation => "constraint violation",
            Self::Decode => "decode",
            Self::Query => "query",
        };
        f.write_str(name)
    }
}

/// Unified error type for all layers of Keystone.
///
/// Every failure escaping the service layer is one of these variants, and the
/// REST translation boundary maps each variant to exactly one transport status.
#[derive(Error, Debug)]
pub enum KeystoneError {
    // ============ Caller-facing outcomes ============
    /// Malformed or invalid input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A domain rule rejected the operation.
    #[error("{message}")]
    BusinessRule { message: String, status: u16 },

    /// Resource not found
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    // ============ Infrastructure Errors ============
    /// Persistence store failure.
    #[error("Persistence error ({kind}): {message}")]
    Persistence { kind: PersistenceKind, message: String },

    /// Redis/Cache error. Never escapes the typed cache facade.
    #[error("Cache error: {0}")]
    Cache(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ============ Internal Errors ============
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KeystoneError {
    /// Default status carried by business-rule failures.
    pub const DEFAULT_BUSINESS_RULE_STATUS: u16 = 400;

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::BusinessRule { status, .. } => *status,
            Self::NotFound { .. } => 404,
            Self::Persistence { .. }
            | Self::Cache(_)
            | Self::Configuration(_)
            | Self::Internal(_)
            | Self::Other(_) => 500,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BusinessRule { .. } => "BUSINESS_RULE_VIOLATION",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Persistence { .. } => "PERSISTENCE_ERROR",
            Self::Cache(_) => "CACHE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the message that may cross the system boundary.
    ///
    /// Infrastructure and unclassified failures collapse to a generic message.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(message) | Self::BusinessRule { message, .. } => message.clone(),
            Self::NotFound { .. } => NOT_FOUND_MESSAGE.to_string(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    /// Returns true for outcomes raised deliberately for the caller.
    #[must_use]
    pub const fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::BusinessRule { .. } | Self::NotFound { .. }
        )
    }

    /// Checks if this error is worth retrying against the store.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Persistence {
                kind: PersistenceKind::Connectivity,
                ..
            }
        )
    }

    /// Creates a not found error for a resource.
    #[must_use]
    pub fn not_found<T: ToString>(resource_type: &'static str, id: T) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a business-rule failure with the default status.
    #[must_use]
    pub fn business_rule<T: Into<String>>(message: T) -> Self {
        Self::business_rule_with_status(message, Self::DEFAULT_BUSINESS_RULE_STATUS)
    }

    /// Creates a business-rule failure carrying a caller-chosen status.
    #[must_use]
    pub fn business_rule_with_status<T: Into<String>>(message: T, status: u16) -> Self {
        Self::BusinessRule {
            message: message.into(),
            status,
        }
    }

    /// Creates a persistence error.
    #[must_use]
    pub fn persistence<T: Into<String>>(kind: PersistenceKind, message: T) -> Self {
        Self::Persistence {
            kind,
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for KeystoneError {
    fn from(err: sqlx::Error) -> Self {
        let kind = match &err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => PersistenceKind::Connectivity,
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation()
                    || db_err.is_foreign_key_violation()
                    || db_err.is_check_violation()
                {
                    PersistenceKind::ConstraintViolation
                } else {
                    PersistenceKind::Query
                }
            }
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::TypeNotFound { .. } => PersistenceKind::Decode,
            _ => PersistenceKind::Query,
        };
        Self::Persistence {
            kind,
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for KeystoneError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON serialization error: {}", err))
    }
}
