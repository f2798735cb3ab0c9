//! Core library for Taskboard.
//!
//! This crate provides the task model, the list query builder and the
//! database operations for Taskboard, independent of any transport layer.
//!
//! # Usage
//!
//! ```no_run
//! use taskboard_core::db::Database;
//! use taskboard_core::models::*;
//!
//! let db = Database::open_default()?;
//! db.migrate()?;
//!
//! let query = TaskQuery::from_params(&ListParams::default());
//! let tasks = db.list_tasks(&query)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod db;
pub mod error;
pub mod models;

// Re-export commonly used types at crate root
pub use db::Database;
pub use error::{TaskError, TaskResult};
