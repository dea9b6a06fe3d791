//! Task model - the binding of input handles, a function and output handles.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::handle::SharedHandle;
use crate::id::TaskId;
use crate::{TaskError, Value};

/// Function bound to a task.
///
/// Receives the current values of the task's inputs in declared order.
pub type TaskFunction = Arc<dyn Fn(&[Value]) -> anyhow::Result<TaskOutput> + Send + Sync>;

/// Result produced by a task function.
///
/// A single value always maps onto exactly one output, even when the value
/// itself is a JSON array. Several values map positionally onto the outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TaskOutput {
    /// One result
    Single(Value),
    /// Ordered results, one per output
    Many(Vec<Value>),
}

impl TaskOutput {
    /// Normalize into an ordered sequence of results.
    pub fn into_values(self) -> Vec<Value> {
        match self {
            TaskOutput::Single(value) => vec![value],
            TaskOutput::Many(values) => values,
        }
    }

    /// Number of results carried.
    pub fn len(&self) -> usize {
        match self {
            TaskOutput::Single(_) => 1,
            TaskOutput::Many(values) => values.len(),
        }
    }

    /// Whether no result is carried.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Value> for TaskOutput {
    fn from(value: Value) -> Self {
        TaskOutput::Single(value)
    }
}

impl From<Vec<Value>> for TaskOutput {
    fn from(values: Vec<Value>) -> Self {
        TaskOutput::Many(values)
    }
}

impl From<(Value, Value)> for TaskOutput {
    fn from((a, b): (Value, Value)) -> Self {
        TaskOutput::Many(vec![a, b])
    }
}

impl From<(Value, Value, Value)> for TaskOutput {
    fn from((a, b, c): (Value, Value, Value)) -> Self {
        TaskOutput::Many(vec![a, b, c])
    }
}

/// A task binds an ordered list of inputs to a function and an ordered
/// list of outputs.
///
/// Tasks are immutable once built; to rewire handles build a new task.
#[derive(Clone)]
pub struct Task {
    id: TaskId,
    name: String,
    inputs: Vec<SharedHandle>,
    function: TaskFunction,
    outputs: Vec<SharedHandle>,
}

impl Task {
    /// Create a new task.
    ///
    /// Fails if the name is empty or if a handle id appears twice among the
    /// inputs or twice among the outputs. A handle may be both an input and
    /// an output.
    pub fn new<F>(
        name: impl Into<String>,
        inputs: Vec<SharedHandle>,
        function: F,
        outputs: Vec<SharedHandle>,
    ) -> Result<Self, TaskError>
    where
        F: Fn(&[Value]) -> anyhow::Result<TaskOutput> + Send + Sync + 'static,
    {
        Self::from_parts(name.into(), inputs, Arc::new(function), outputs)
    }

    /// Start building a task.
    pub fn builder(name: impl Into<String>) -> TaskBuilder {
        TaskBuilder::new(name)
    }

    fn from_parts(
        name: String,
        inputs: Vec<SharedHandle>,
        function: TaskFunction,
        outputs: Vec<SharedHandle>,
    ) -> Result<Self, TaskError> {
        if name.trim().is_empty() {
            return Err(TaskError::EmptyName);
        }

        if let Some(id) = first_duplicate(&inputs) {
            return Err(TaskError::DuplicateInput { name, id });
        }
        if let Some(id) = first_duplicate(&outputs) {
            return Err(TaskError::DuplicateOutput { name, id });
        }

        Ok(Self {
            id: TaskId::new(),
            name,
            inputs,
            function,
            outputs,
        })
    }

    /// Unique identifier
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Task name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Input handles in positional order
    pub fn inputs(&self) -> &[SharedHandle] {
        &self.inputs
    }

    /// Output handles in positional order
    pub fn outputs(&self) -> &[SharedHandle] {
        &self.outputs
    }

    /// Bound function
    pub fn function(&self) -> &TaskFunction {
        &self.function
    }

    /// Invoke the bound function with already resolved arguments.
    pub fn call(&self, args: &[Value]) -> anyhow::Result<TaskOutput> {
        (self.function)(args)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("inputs", &handle_ids(&self.inputs))
            .field("outputs", &handle_ids(&self.outputs))
            .finish_non_exhaustive()
    }
}

fn handle_ids(handles: &[SharedHandle]) -> Vec<&str> {
    handles.iter().map(|h| h.id()).collect()
}

fn first_duplicate(handles: &[SharedHandle]) -> Option<String> {
    let mut seen = HashSet::new();
    handles
        .iter()
        .map(|h| h.id())
        .find(|id| !seen.insert(*id))
        .map(str::to_string)
}

/// Builder for [`Task`].
pub struct TaskBuilder {
    name: String,
    inputs: Vec<SharedHandle>,
    function: Option<TaskFunction>,
    outputs: Vec<SharedHandle>,
}

impl TaskBuilder {
    /// Create a new builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            function: None,
            outputs: Vec::new(),
        }
    }

    /// Append an input handle.
    pub fn input(mut self, handle: SharedHandle) -> Self {
        self.inputs.push(handle);
        self
    }

    /// Append several input handles.
    pub fn inputs(mut self, handles: impl IntoIterator<Item = SharedHandle>) -> Self {
        self.inputs.extend(handles);
        self
    }

    /// Append an output handle.
    pub fn output(mut self, handle: SharedHandle) -> Self {
        self.outputs.push(handle);
        self
    }

    /// Append several output handles.
    pub fn outputs(mut self, handles: impl IntoIterator<Item = SharedHandle>) -> Self {
        self.outputs.extend(handles);
        self
    }

    /// Set the function.
    pub fn function<F>(mut self, function: F) -> Self
    where
        F: Fn(&[Value]) -> anyhow::Result<TaskOutput> + Send + Sync + 'static,
    {
        self.function = Some(Arc::new(function));
        self
    }

    /// Build the task.
    pub fn build(self) -> Result<Task, TaskError> {
        let Some(function) = self.function else {
            return Err(TaskError::MissingFunction { name: self.name });
        };
        Task::from_parts(self.name, self.inputs, function, self.outputs)
    }
}
