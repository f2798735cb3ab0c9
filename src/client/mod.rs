//! Client side of the task API: an HTTP client and an optimistic store.

mod cache;
mod http;
mod store;

use thiserror::Error;

pub use cache::{CacheError, MutationId, MutationState, TaskCache, Tentative};
pub use http::TaskClient;
pub use store::TaskStore;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error body.
    #[error("server returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
