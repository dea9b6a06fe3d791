//! The execution engine - runs one task against its data handles.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use taskwire_core::{Task, Value, WriteError};
use tracing::{debug, error, info, warn};

use crate::{ExecutionError, ExecutionReport, TaskState};

/// Runs tasks.
///
/// Each execution follows a fixed sequence:
/// ```text
/// Read inputs → Call function → Check arity → Write outputs
/// ```
///
/// Failures never propagate out of [`execute`](ExecutionEngine::execute).
/// A failing function or an arity mismatch leaves every output untouched;
/// a failing output write leaves only that output untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionEngine;

impl ExecutionEngine {
    /// Create a new execution engine.
    pub fn new() -> Self {
        Self
    }

    /// Execute a task once.
    pub fn execute(&self, task: &Task) -> ExecutionReport {
        let started_at = chrono::Utc::now();
        debug!(
            task = %task.name(),
            inputs = task.inputs().len(),
            outputs = task.outputs().len(),
            "Executing task"
        );

        // 1. Resolve inputs in positional order
        let args: Vec<Value> = task.inputs().iter().map(|input| input.read()).collect();

        // 2. Call the function
        let output = match panic::catch_unwind(AssertUnwindSafe(|| task.call(&args))) {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return self.function_failed(task, started_at, format!("{:#}", e));
            }
            Err(payload) => {
                let message = format!("panicked: {}", panic_message(payload.as_ref()));
                return self.function_failed(task, started_at, message);
            }
        };

        // 3. All-or-nothing arity gate
        let results = output.into_values();
        let expected = task.outputs().len();
        if results.len() != expected {
            let err = ExecutionError::OutputCountMismatch {
                task: task.name().to_string(),
                expected,
                actual: results.len(),
            };
            warn!(task = %task.name(), "{}", err);
            return ExecutionReport::failed(task, started_at, err);
        }

        // 4. Write every output independently
        let mut written = Vec::with_capacity(expected);
        let mut errors = Vec::new();
        for (handle, value) in task.outputs().iter().zip(results) {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| handle.write(value)))
                .unwrap_or_else(|payload| {
                    Err(WriteError::Panicked {
                        id: handle.id().to_string(),
                        message: panic_message(payload.as_ref()),
                    })
                });
            match outcome {
                Ok(()) => written.push(handle.id().to_string()),
                Err(source) => {
                    let err = ExecutionError::OutputWrite {
                        task: task.name().to_string(),
                        handle: handle.id().to_string(),
                        source,
                    };
                    error!(task = %task.name(), handle = %handle.id(), "{}", err);
                    errors.push(err);
                }
            }
        }

        info!(
            task = %task.name(),
            written = written.len(),
            failed = errors.len(),
            "Task completed"
        );

        ExecutionReport {
            task_id: task.id(),
            task_name: task.name().to_string(),
            state: TaskState::Completed,
            written,
            errors,
            started_at,
            finished_at: chrono::Utc::now(),
        }
    }

    fn function_failed(
        &self,
        task: &Task,
        started_at: taskwire_core::Time,
        message: String,
    ) -> ExecutionReport {
        let err = ExecutionError::FunctionExecution {
            task: task.name().to_string(),
            message,
        };
        error!(task = %task.name(), "{}", err);
        ExecutionReport::failed(task, started_at, err)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
