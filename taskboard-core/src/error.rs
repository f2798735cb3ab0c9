//! Error taxonomy for task operations.

use thiserror::Error;

/// Failure of a task operation.
///
/// Each variant maps onto one class of HTTP response: bad input, a missing
/// (or soft-deleted) task, or a storage failure.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Malformed id or missing/invalid field.
    #[error("{0}")]
    InvalidArgument(String),

    /// No live task has the requested id.
    #[error("Task not found")]
    NotFound,

    #[error(transparent)]
    Storage(#[from] rusqlite::Error),

    /// A previous holder of the connection panicked.
    #[error("database connection lock poisoned")]
    LockPoisoned,
}

impl TaskError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Whether this error is the caller's fault rather than the server's.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidArgument(_) | Self::NotFound)
    }
}

/// Result type for task operations.
pub type TaskResult<T> = std::result::Result<T, TaskError>;
