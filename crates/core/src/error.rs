//! Errors raised while building tasks and writing data handles.

/// Errors that make a task impossible to construct.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    /// Task name is empty
    #[error("task name must not be empty")]
    EmptyName,

    /// Builder finished without a function
    #[error("task '{name}' has no function")]
    MissingFunction {
        /// Task name
        name: String,
    },

    /// The same handle is bound to two input positions
    #[error("task '{name}' binds input '{id}' more than once")]
    DuplicateInput {
        /// Task name
        name: String,
        /// Handle id
        id: String,
    },

    /// The same handle is bound to two output positions
    #[error("task '{name}' binds output '{id}' more than once")]
    DuplicateOutput {
        /// Task name
        name: String,
        /// Handle id
        id: String,
    },
}

/// Errors returned by [`DataHandle::write`](crate::DataHandle::write).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WriteError {
    /// Writing has been disabled on this handle
    #[error("writes to '{id}' are disabled")]
    Disabled {
        /// Handle id
        id: String,
    },

    /// The backing store rejected the value
    #[error("backend error on '{id}': {message}")]
    Backend {
        /// Handle id
        id: String,
        /// Backend error message
        message: String,
    },

    /// The handle panicked while writing
    #[error("write to '{id}' panicked: {message}")]
    Panicked {
        /// Handle id
        id: String,
        /// Panic message
        message: String,
    },
}

impl WriteError {
    /// Wrap a backend failure.
    pub fn backend(id: impl Into<String>, err: impl std::fmt::Display) -> Self {
        WriteError::Backend {
            id: id.into(),
            message: err.to_string(),
        }
    }
}
