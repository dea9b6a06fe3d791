//! Execution state and diagnostic report.

use std::fmt;

use serde::{Deserialize, Serialize};
use taskwire_core::{Task, TaskId, Time};

use crate::ExecutionError;

/// State of one submitted task.
///
/// ```text
/// Queued → Running → Completed
///                  ↘ Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskState {
    /// Waiting for a worker
    Queued,
    /// Function is running or outputs are being written
    Running,
    /// Results were mapped onto the outputs
    Completed,
    /// Nothing was written: the function failed or its results did not
    /// match the outputs
    Failed,
}

impl TaskState {
    /// Whether the state is terminal.
    pub fn is_finished(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Queued => write!(f, "queued"),
            TaskState::Running => write!(f, "running"),
            TaskState::Completed => write!(f, "completed"),
            TaskState::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome of executing a task once.
///
/// Purely informational: the outputs themselves carry the results.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    /// Executed task
    pub task_id: TaskId,
    /// Executed task name
    pub task_name: String,
    /// Terminal state
    pub state: TaskState,
    /// Ids of the outputs that were written, in output order
    pub written: Vec<String>,
    /// Everything that went wrong
    pub errors: Vec<ExecutionError>,
    /// When execution started
    pub started_at: Time,
    /// When execution finished
    pub finished_at: Time,
}

impl ExecutionReport {
    pub(crate) fn failed(task: &Task, started_at: Time, error: ExecutionError) -> Self {
        Self {
            task_id: task.id(),
            task_name: task.name().to_string(),
            state: TaskState::Failed,
            written: Vec::new(),
            errors: vec![error],
            started_at,
            finished_at: chrono::Utc::now(),
        }
    }

    /// Completed with every output written.
    pub fn is_success(&self) -> bool {
        self.state == TaskState::Completed && self.errors.is_empty()
    }

    /// Wall time spent executing.
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
