//! HTTP-facing response envelope and error mapping.
//!
//! Every endpoint answers with the same envelope: `{"success": true,
//! "data": ...}` on success, `{"success": false, "error": {"kind",
//! "message"}}` on failure. The error kind is stable so callers can branch
//! on it; the message is for humans.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use wardflow_coordinator::CoordinatorError;
use wardflow_registry::RegistryError;
use wardflow_storage::StorageError;

/// Stable machine-readable error kinds exposed over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    AlreadyExists,
    InvalidTransition,
    Conflict,
    NotAssigned,
    /// A coordinator operation completed its bed-side step but not its
    /// patient-side step; run the reconciliation sweep.
    PartialFailure,
    StoreUnavailable,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::InvalidTransition => "invalid_transition",
            Self::Conflict => "conflict",
            Self::NotAssigned => "not_assigned",
            Self::PartialFailure => "partial_failure",
            Self::StoreUnavailable => "store_unavailable",
            Self::Internal => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::AlreadyExists | Self::InvalidTransition | Self::Conflict | Self::NotAssigned => {
                StatusCode::CONFLICT
            }
            Self::PartialFailure | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            Self::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An API error: a stable kind plus a human-readable message.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn status_code(&self) -> StatusCode {
        self.kind.status_code()
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        let kind = match &err {
            RegistryError::Validation { .. } => ErrorKind::Validation,
            RegistryError::NotFound { .. } => ErrorKind::NotFound,
            RegistryError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            RegistryError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            RegistryError::Conflict { .. } => ErrorKind::Conflict,
            RegistryError::Store(store) => match store {
                StorageError::VersionConflict { .. } => ErrorKind::Conflict,
                StorageError::Unavailable { .. } => ErrorKind::StoreUnavailable,
                StorageError::InvalidRecord { .. } => ErrorKind::Validation,
                StorageError::NotFound { .. } => ErrorKind::NotFound,
                StorageError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            },
        };
        Self::new(kind, err.to_string())
    }
}

impl From<CoordinatorError> for ApiError {
    fn from(err: CoordinatorError) -> Self {
        match err {
            CoordinatorError::NotAssigned { .. } => {
                Self::new(ErrorKind::NotAssigned, err.to_string())
            }
            CoordinatorError::PartialFailure { .. } => {
                Self::new(ErrorKind::PartialFailure, err.to_string())
            }
            CoordinatorError::Registry(inner) => inner.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "success": false,
            "error": {
                "kind": self.kind.as_str(),
                "message": self.message,
            }
        });
        (status, Json(body)).into_response()
    }
}

/// Wraps a payload in the success envelope.
pub fn ok<T: Serialize>(data: T) -> Json<serde_json::Value> {
    Json(json!({ "success": true, "data": data }))
}

/// Wraps a payload in the success envelope with a `201 Created` status.
pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::CREATED, ok(data))
}
