//! Handle returned for every submitted task.

use taskwire_core::SubmissionId;
use tokio::sync::{oneshot, watch};

use crate::{ExecutionReport, TaskState};

/// Tracks one submission of a task.
///
/// Dropping it does not affect execution; callers that only care about
/// outputs can ignore it and re-read the output handles later.
#[derive(Debug)]
pub struct Submission {
    id: SubmissionId,
    task_name: String,
    state: watch::Receiver<TaskState>,
    report: oneshot::Receiver<ExecutionReport>,
}

/// Producer side of a [`Submission`], owned by whoever runs the task.
#[derive(Debug)]
pub(crate) struct Completion {
    state: watch::Sender<TaskState>,
    report: oneshot::Sender<ExecutionReport>,
}

/// Create a queued submission and its completion side.
pub(crate) fn channel(id: SubmissionId, task_name: &str) -> (Completion, Submission) {
    let (state_tx, state_rx) = watch::channel(TaskState::Queued);
    let (report_tx, report_rx) = oneshot::channel();

    let completion = Completion {
        state: state_tx,
        report: report_tx,
    };
    let submission = Submission {
        id,
        task_name: task_name.to_string(),
        state: state_rx,
        report: report_rx,
    };
    (completion, submission)
}

impl Completion {
    /// Mark the task as picked up.
    pub(crate) fn running(&self) {
        self.state.send_replace(TaskState::Running);
    }

    /// Publish the final report.
    pub(crate) fn finish(self, report: ExecutionReport) {
        self.state.send_replace(report.state);
        // The submission may already be dropped.
        let _ = self.report.send(report);
    }
}

impl Submission {
    /// Submission id
    pub fn id(&self) -> SubmissionId {
        self.id
    }

    /// Name of the submitted task
    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    /// Current state.
    pub fn state(&self) -> TaskState {
        *self.state.borrow()
    }

    /// Whether the task reached a terminal state.
    pub fn is_finished(&self) -> bool {
        self.state().is_finished()
    }

    /// Wait for the execution report.
    ///
    /// Returns `None` if the scheduler was dropped before the task ran.
    pub async fn wait(self) -> Option<ExecutionReport> {
        self.report.await.ok()
    }

    /// Blocking variant of [`wait`](Submission::wait).
    ///
    /// # Panics
    ///
    /// Panics when called from within an asynchronous execution context.
    pub fn blocking_wait(self) -> Option<ExecutionReport> {
        self.report.blocking_recv().ok()
    }
}
