//! Taskboard: task management over HTTP.
//!
//! The storage layer and task model live in `taskboard-core`; this crate adds
//! the axum API, configuration, and an HTTP client with an optimistic cache.

pub mod api;
pub mod client;
pub mod config;
pub mod format;

pub use taskboard_core::{db, models};
