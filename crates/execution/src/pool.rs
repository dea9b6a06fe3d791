//! Background worker pool for parallel execution.
//!
//! The pool owns a dedicated multi-threaded tokio runtime. A fixed number of
//! worker loops share one unbounded queue; each dequeued task is executed
//! through [`tokio::task::spawn_blocking`] because task functions are plain
//! blocking code and may hold external locks for arbitrary amounts of time.

use std::num::NonZeroUsize;
use std::sync::Arc;

use taskwire_core::{SubmissionId, Task};
use tokio::runtime::Runtime;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::submission::Completion;
use crate::{ExecutionEngine, ExecutionError, ExecutionReport, SchedulerError};

/// A task waiting in the queue.
pub(crate) struct Job {
    pub(crate) id: SubmissionId,
    pub(crate) task: Arc<Task>,
    pub(crate) completion: Completion,
}

type Queue = Arc<Mutex<mpsc::UnboundedReceiver<Job>>>;

/// Fixed-size pool of workers pulling tasks from a shared queue.
///
/// Tasks run concurrently with each other and with the submitting thread;
/// no ordering is guaranteed between tasks.
pub struct WorkerPool {
    sender: Option<mpsc::UnboundedSender<Job>>,
    workers: Vec<JoinHandle<()>>,
    runtime: Option<Runtime>,
}

impl WorkerPool {
    /// Start a pool of `size` workers.
    pub fn start(engine: ExecutionEngine, size: NonZeroUsize) -> Result<Self, SchedulerError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(size.get())
            .thread_name("taskwire-worker")
            .enable_all()
            .build()?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let queue: Queue = Arc::new(Mutex::new(receiver));

        let workers = (0..size.get())
            .map(|worker| runtime.spawn(worker_loop(worker, Arc::clone(&queue), engine)))
            .collect();

        info!(workers = size.get(), "Worker pool started");

        Ok(Self {
            sender: Some(sender),
            workers,
            runtime: Some(runtime),
        })
    }

    /// Number of workers.
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    pub(crate) fn enqueue(&self, job: Job) -> Result<(), SchedulerError> {
        let sender = self.sender.as_ref().ok_or(SchedulerError::PoolUnavailable)?;
        sender.send(job).map_err(|_| SchedulerError::PoolUnavailable)
    }

    /// Stop accepting tasks, then wait until every queued and running task
    /// has finished.
    ///
    /// # Panics
    ///
    /// Panics when called from within an asynchronous execution context.
    pub fn shutdown(mut self) {
        drop(self.sender.take());

        let workers = std::mem::take(&mut self.workers);
        if let Some(runtime) = self.runtime.take() {
            runtime.block_on(async {
                for worker in workers {
                    if let Err(e) = worker.await {
                        warn!("Worker ended abnormally: {}", e);
                    }
                }
            });
            runtime.shutdown_background();
        }

        info!("Worker pool stopped");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            // Abandons queued tasks; never blocks, so it is safe inside async code.
            runtime.shutdown_background();
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers.len())
            .field("accepting", &self.sender.is_some())
            .finish()
    }
}

async fn worker_loop(worker: usize, queue: Queue, engine: ExecutionEngine) {
    debug!(worker, "Worker started");

    loop {
        let next = queue.lock().await.recv().await;
        let Some(job) = next else {
            break;
        };

        debug!(worker, submission = %job.id, task = %job.task.name(), "Task dequeued");
        job.completion.running();

        let task = Arc::clone(&job.task);
        let report = match tokio::task::spawn_blocking(move || engine.execute(&task)).await {
            Ok(report) => report,
            Err(e) => {
                error!(worker, submission = %job.id, "Execution aborted: {}", e);
                ExecutionReport::failed(
                    &job.task,
                    chrono::Utc::now(),
                    ExecutionError::FunctionExecution {
                        task: job.task.name().to_string(),
                        message: e.to_string(),
                    },
                )
            }
        };

        job.completion.finish(report);
    }

    debug!(worker, "Worker stopped");
}
