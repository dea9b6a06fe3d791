//! Execution layer - running tasks and scheduling their execution.

#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod error;
pub mod pool;
pub mod report;
pub mod scheduler;
pub mod submission;

pub use config::SchedulerConfig;
pub use engine::ExecutionEngine;
pub use error::{ExecutionError, SchedulerError};
pub use pool::WorkerPool;
pub use report::{ExecutionReport, TaskState};
pub use scheduler::Scheduler;
pub use submission::Submission;
