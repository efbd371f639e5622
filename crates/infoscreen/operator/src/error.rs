//! Error types for infoscreen-operator

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use infoscreen_types::{ChildKind, ObjectKey, OwnerReference};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by a resource store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Object with the same identity already exists
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Write rejected because of a concurrent change
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Write rejected by validation or quota
    #[error("Invalid: {0}")]
    Invalid(String),

    /// Store could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Call abandoned because the caller's deadline passed
    #[error("Cancelled: {0}")]
    Cancelled(String),
}

/// Failure of a single reconciliation pass
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A store call failed; carried through unchanged
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A child with the synthesized identity is controlled by someone else
    #[error("{kind} {key} is controlled by {} {} ({})", owner.kind, owner.name, owner.uid)]
    NotOwned {
        kind: ChildKind,
        key: ObjectKey,
        owner: Box<OwnerReference>,
    },

    /// The invoking controller's deadline for the pass expired
    #[error("Reconciliation deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}

/// Daemon-level errors
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server startup error
    #[error("Server error: {0}")]
    Server(String),

    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// API-specific errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) | ApiError::Store(StoreError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND")
            }
            ApiError::BadRequest(_) | ApiError::Store(StoreError::Invalid(_)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST")
            }
            ApiError::Store(StoreError::AlreadyExists(_) | StoreError::Conflict(_)) => {
                (StatusCode::CONFLICT, "CONFLICT")
            }
            ApiError::Store(StoreError::Unavailable(_) | StoreError::Cancelled(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE")
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for reconciliation passes
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;
