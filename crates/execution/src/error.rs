//! Execution and scheduling errors.

use taskwire_core::WriteError;

/// Failures recorded while executing a task.
///
/// These never escape [`Scheduler::submit`](crate::Scheduler::submit); they
/// are logged and collected in the [`ExecutionReport`](crate::ExecutionReport).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    /// The bound function returned an error or panicked
    #[error("function of task '{task}' failed: {message}")]
    FunctionExecution {
        /// Task name
        task: String,
        /// Error message
        message: String,
    },

    /// Result arity does not match the declared outputs
    #[error("task '{task}' produced {actual} result(s) for {expected} output(s)")]
    OutputCountMismatch {
        /// Task name
        task: String,
        /// Declared output count
        expected: usize,
        /// Produced result count
        actual: usize,
    },

    /// A single output could not be written
    #[error("task '{task}' could not write output '{handle}': {source}")]
    OutputWrite {
        /// Task name
        task: String,
        /// Output handle id
        handle: String,
        /// Underlying write failure
        #[source]
        source: WriteError,
    },
}

/// Errors returned by the scheduler itself.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// The worker runtime could not be created
    #[error("failed to start worker pool: {0}")]
    Runtime(#[from] std::io::Error),

    /// The worker pool is gone or was never started
    #[error("worker pool is not accepting tasks")]
    PoolUnavailable,
}
