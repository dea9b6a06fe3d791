//! taskwire core data models.
//!
//! This crate defines the values a task execution is built from: data
//! handles that hold a single opaque value, and tasks that bind an ordered
//! list of input handles to a function and an ordered list of output handles.

#![warn(missing_docs)]

// Core identities
mod id;

// Data handles
mod scope;
mod handle;

// Tasks
mod task;
mod error;

// Re-exports
pub use id::*;

pub use scope::Scope;
pub use handle::{DataHandle, SharedHandle};
pub use task::{Task, TaskBuilder, TaskFunction, TaskOutput};
pub use error::{TaskError, WriteError};

/// Opaque payload carried by a data handle.
pub type Value = serde_json::Value;

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
