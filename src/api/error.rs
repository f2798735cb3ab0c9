//! API error responses.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use taskboard_core::TaskError;

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// An error ready to be turned into an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Map a failed task operation. `action` names it in storage failures,
    /// e.g. `"Failed to update task: disk I/O error"`.
    pub fn task(action: &str, err: TaskError) -> Self {
        match err {
            TaskError::InvalidArgument(message) => {
                tracing::warn!("Rejected request to {} task: {}", action, message);
                Self::bad_request(message)
            }
            TaskError::NotFound => {
                tracing::warn!("Task not found while trying to {} it", action);
                Self::not_found(TaskError::NotFound.to_string())
            }
            err @ (TaskError::Storage(_) | TaskError::LockPoisoned) => {
                tracing::error!("Error trying to {} task: {}", action, err);
                Self::internal(format!("Failed to {} task: {}", action, err))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!("Rejected request body: {}", rejection.body_text());
        Self::bad_request(rejection.body_text())
    }
}
