//! Task submission and dispatch.

use std::sync::Arc;

use taskwire_core::{SubmissionId, Task};
use tracing::debug;

use crate::pool::Job;
use crate::submission::{self, Submission};
use crate::{ExecutionEngine, SchedulerConfig, SchedulerError, WorkerPool};

/// Entry point for running tasks.
///
/// In synchronous mode [`submit`](Scheduler::submit) runs the task on the
/// caller's thread and returns once every output write was attempted. In
/// parallel mode it queues the task on a [`WorkerPool`] and returns
/// immediately; outputs update whenever a worker gets to the task.
///
/// Execution failures are never returned from `submit`. They are logged and
/// available from the [`Submission`]'s report.
#[derive(Debug)]
pub struct Scheduler {
    engine: ExecutionEngine,
    config: SchedulerConfig,
    pool: Option<WorkerPool>,
}

impl Scheduler {
    /// Create a scheduler. Starts the worker pool right away when the
    /// configuration asks for parallel execution.
    pub fn new(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        let engine = ExecutionEngine::new();
        let pool = if config.parallel_execution {
            Some(WorkerPool::start(engine, config.max_workers)?)
        } else {
            None
        };

        Ok(Self {
            engine,
            config,
            pool,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Switch execution mode for subsequent submissions.
    ///
    /// Tasks already queued keep running on the pool.
    pub fn set_parallel_execution(&mut self, enabled: bool) -> Result<(), SchedulerError> {
        if enabled && self.pool.is_none() {
            self.pool = Some(WorkerPool::start(self.engine, self.config.max_workers)?);
        }
        self.config.parallel_execution = enabled;
        Ok(())
    }

    /// Submit a task for execution.
    pub fn submit(&self, task: Arc<Task>) -> Result<Submission, SchedulerError> {
        let id = SubmissionId::new();
        let (completion, submission) = submission::channel(id, task.name());

        if self.config.parallel_execution {
            let pool = self.pool.as_ref().ok_or(SchedulerError::PoolUnavailable)?;
            debug!(submission = %id, task = %task.name(), "Task queued");
            pool.enqueue(Job {
                id,
                task,
                completion,
            })?;
        } else {
            debug!(submission = %id, task = %task.name(), "Running task inline");
            completion.running();
            let report = self.engine.execute(&task);
            completion.finish(report);
        }

        Ok(submission)
    }

    /// Stop the worker pool after draining its queue.
    ///
    /// # Panics
    ///
    /// Panics when called from within an asynchronous execution context
    /// while a worker pool is running.
    pub fn shutdown(self) {
        if let Some(pool) = self.pool {
            pool.shutdown();
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            engine: ExecutionEngine::new(),
            config: SchedulerConfig::default(),
            pool: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;
    use std::thread;
    use std::time::{Duration, Instant};

    use anyhow::Context;
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use taskwire_core::{DataHandle, Scope, SharedHandle, TaskOutput, WriteError};
    use taskwire_storage::InMemoryDataHandle;

    use crate::engine::testing::PanickingHandle;
    use crate::{ExecutionError, TaskState};

    fn mult(args: &[Value]) -> anyhow::Result<i64> {
        let nb1 = args[0].as_i64().context("nb1 is not an integer")?;
        let nb2 = args[1].as_i64().context("nb2 is not an integer")?;
        Ok(nb1 * nb2)
    }

    fn lock_mult(
        lock: Arc<Mutex<()>>,
    ) -> impl Fn(&[Value]) -> anyhow::Result<TaskOutput> + Send + Sync + 'static {
        move |args| {
            let _guard = lock.lock();
            Ok(json!(mult(args)?).into())
        }
    }

    fn create_task<F>(function: F, nb_outputs: usize) -> (Arc<Task>, Vec<Arc<InMemoryDataHandle>>)
    where
        F: Fn(&[Value]) -> anyhow::Result<TaskOutput> + Send + Sync + 'static,
    {
        let inputs = vec![
            InMemoryDataHandle::shared("input1", Scope::Pipeline, json!(21)),
            InMemoryDataHandle::shared("input2", Scope::Pipeline, json!(2)),
        ];
        let outputs: Vec<Arc<InMemoryDataHandle>> = (0..nb_outputs)
            .map(|i| Arc::new(InMemoryDataHandle::new(format!("output{}", i), Scope::Pipeline, json!(0))))
            .collect();
        let shared_outputs = outputs.iter().map(|o| -> SharedHandle { o.clone() }).collect();

        let name = format!("task-{}", taskwire_core::TaskId::new());
        let task = Task::new(name, inputs, function, shared_outputs).unwrap();
        (Arc::new(task), outputs)
    }

    fn eventually(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(20));
        }
        condition()
    }

    #[test]
    fn test_scheduled_task() {
        let scheduler = Scheduler::default();
        let (task, outputs) = create_task(|args| Ok(json!(mult(args)?).into()), 1);

        let submission = scheduler.submit(task).unwrap();

        assert_eq!(outputs[0].read(), json!(42));
        assert_eq!(submission.state(), TaskState::Completed);
        assert!(submission.blocking_wait().unwrap().is_success());
    }

    #[test]
    fn test_scheduled_task_that_return_multiple_outputs() {
        let scheduler = Scheduler::default();
        let (with_tuple, tuple_outputs) = create_task(
            |args| {
                let product = mult(args)?;
                Ok((json!(product), json!(product / 2)).into())
            },
            2,
        );
        let (with_list, list_outputs) = create_task(
            |args| {
                let product = mult(args)?;
                Ok(vec![json!(product), json!(product / 2)].into())
            },
            2,
        );

        scheduler.submit(with_tuple).unwrap();
        scheduler.submit(with_list).unwrap();

        assert_eq!(tuple_outputs[0].read(), list_outputs[0].read());
        assert_eq!(tuple_outputs[0].read(), json!(42));
        assert_eq!(tuple_outputs[1].read(), list_outputs[1].read());
        assert_eq!(tuple_outputs[1].read(), json!(21));
    }

    #[test]
    fn test_mismatched_result_count_leaves_output_unwritten() {
        let scheduler = Scheduler::default();
        let (task, outputs) = create_task(
            |args| {
                let product = mult(args)?;
                Ok((json!(product), json!(product / 2)).into())
            },
            1,
        );

        let submission = scheduler.submit(task).unwrap();

        assert_eq!(outputs[0].read(), json!(0));
        assert_eq!(submission.state(), TaskState::Failed);
        let report = submission.blocking_wait().unwrap();
        assert!(matches!(
            &report.errors[..],
            [ExecutionError::OutputCountMismatch { expected: 1, actual: 2, .. }]
        ));
    }

    #[test]
    fn test_write_error_does_not_stop_other_outputs() {
        let scheduler = Scheduler::default();
        let (task, outputs) = create_task(|_| Ok((json!(42), json!(21)).into()), 2);
        outputs[0].set_writable(false);

        let submission = scheduler.submit(task).unwrap();

        assert_eq!(outputs[0].read(), json!(0));
        assert_eq!(outputs[1].read(), json!(21));
        assert_eq!(submission.state(), TaskState::Completed);
    }

    #[test]
    fn test_function_error_is_not_returned_from_submit() {
        let scheduler = Scheduler::default();
        let (task, outputs) = create_task(|_| anyhow::bail!("no result"), 1);

        let submission = scheduler.submit(task).unwrap();

        assert_eq!(outputs[0].read(), json!(0));
        assert_eq!(submission.state(), TaskState::Failed);
    }

    #[test]
    fn test_scheduled_task_in_parallel() {
        let scheduler = Scheduler::new(SchedulerConfig::parallel()).unwrap();
        let lock = Arc::new(Mutex::new(()));
        let (task, outputs) = create_task(lock_mult(Arc::clone(&lock)), 1);

        let guard = lock.lock();
        let submission = scheduler.submit(task).unwrap();
        assert_eq!(outputs[0].read(), json!(0));
        assert!(!submission.is_finished());
        drop(guard);

        assert!(eventually(|| outputs[0].read() == json!(42)));
        let report = submission.blocking_wait().unwrap();
        assert!(report.is_success());
    }

    #[test]
    fn test_scheduled_task_multithreading_multiple_task() {
        let scheduler = Scheduler::new(SchedulerConfig::parallel()).unwrap();
        let lock_1 = Arc::new(Mutex::new(()));
        let lock_2 = Arc::new(Mutex::new(()));
        let (task_1, outputs_1) = create_task(lock_mult(Arc::clone(&lock_1)), 1);
        let (task_2, outputs_2) = create_task(lock_mult(Arc::clone(&lock_2)), 1);

        let guard_1 = lock_1.lock();
        let guard_2 = lock_2.lock();
        scheduler.submit(task_1).unwrap();
        scheduler.submit(task_2).unwrap();
        assert_eq!(outputs_1[0].read(), json!(0));
        assert_eq!(outputs_2[0].read(), json!(0));

        drop(guard_2);
        assert!(eventually(|| outputs_2[0].read() == json!(42)));
        assert_eq!(outputs_1[0].read(), json!(0));

        drop(guard_1);
        assert!(eventually(|| outputs_1[0].read() == json!(42)));
        assert_eq!(outputs_2[0].read(), json!(42));
    }

    #[test]
    fn test_parallel_write_error_is_isolated() {
        let scheduler = Scheduler::new(SchedulerConfig::parallel()).unwrap();
        let (task, outputs) = create_task(|_| Ok((json!(42), json!(21)).into()), 2);
        outputs[0].set_writable(false);

        let report = scheduler.submit(task).unwrap().blocking_wait().unwrap();

        assert_eq!(report.state, TaskState::Completed);
        assert_eq!(report.written, vec!["output1"]);
        assert_eq!(outputs[0].read(), json!(0));
        assert_eq!(outputs[1].read(), json!(21));
    }

    fn create_task_with_panicking_output() -> (Arc<Task>, Arc<InMemoryDataHandle>) {
        let output = Arc::new(InMemoryDataHandle::new("output1", Scope::Pipeline, json!(0)));
        let task = Task::builder("panicky")
            .output(Arc::new(PanickingHandle("output0")))
            .output(output.clone())
            .function(|_| Ok((json!(42), json!(21)).into()))
            .build()
            .unwrap();
        (Arc::new(task), output)
    }

    #[test]
    fn test_panicking_write_does_not_escape_submit() {
        let scheduler = Scheduler::default();
        let (task, output) = create_task_with_panicking_output();

        let submission = scheduler.submit(task).unwrap();

        assert_eq!(output.read(), json!(21));
        let report = submission.blocking_wait().unwrap();
        assert_eq!(report.state, TaskState::Completed);
        assert_eq!(report.written, vec!["output1"]);
    }

    #[test]
    fn test_parallel_panicking_write_is_isolated() {
        let scheduler = Scheduler::new(SchedulerConfig::parallel()).unwrap();
        let (task, output) = create_task_with_panicking_output();

        let report = scheduler.submit(task).unwrap().blocking_wait().unwrap();

        assert_eq!(report.state, TaskState::Completed);
        assert_eq!(report.written, vec!["output1"]);
        assert!(matches!(
            &report.errors[..],
            [ExecutionError::OutputWrite { source: WriteError::Panicked { .. }, .. }]
        ));
        assert_eq!(output.read(), json!(21));
    }

    #[test]
    fn test_switch_to_parallel_for_later_submissions() {
        let mut scheduler = Scheduler::default();
        let lock = Arc::new(Mutex::new(()));

        let (sync_task, sync_outputs) = create_task(lock_mult(Arc::clone(&lock)), 1);
        scheduler.submit(sync_task).unwrap();
        assert_eq!(sync_outputs[0].read(), json!(42));

        scheduler.set_parallel_execution(true).unwrap();
        assert!(scheduler.config().parallel_execution);

        let (task, outputs) = create_task(lock_mult(Arc::clone(&lock)), 1);
        let guard = lock.lock();
        scheduler.submit(task).unwrap();
        assert_eq!(outputs[0].read(), json!(0));
        drop(guard);

        assert!(eventually(|| outputs[0].read() == json!(42)));
    }

    #[test]
    fn test_shutdown_drains_queue() {
        let config = SchedulerConfig::parallel().with_max_workers(NonZeroUsize::new(2).unwrap());
        let scheduler = Scheduler::new(config).unwrap();

        let all_outputs: Vec<_> = (0..8)
            .map(|_| {
                let (task, outputs) = create_task(|args| Ok(json!(mult(args)?).into()), 1);
                scheduler.submit(task).unwrap();
                outputs
            })
            .collect();

        scheduler.shutdown();

        for outputs in all_outputs {
            assert_eq!(outputs[0].read(), json!(42));
        }
    }

    #[tokio::test]
    async fn test_wait_for_parallel_submission() {
        let scheduler = Scheduler::new(SchedulerConfig::parallel()).unwrap();
        let (task, outputs) = create_task(|args| Ok(json!(mult(args)?).into()), 1);

        let submission = scheduler.submit(task).unwrap();
        let report = submission.wait().await.unwrap();

        assert_eq!(report.state, TaskState::Completed);
        assert_eq!(outputs[0].read(), json!(42));
    }
}
