//! taskwire CLI - run a built-in function as a task.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use taskwire_core::{DataHandle, Scope, SharedHandle, Task, TaskOutput};
use taskwire_execution::{Scheduler, SchedulerConfig};
use taskwire_storage::{InMemoryDataHandle, JsonFileDataHandle};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "taskwire")]
#[command(about = "Bind data handles to a function and run it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a built-in function as a task
    Run {
        /// Function to bind
        #[arg(value_enum)]
        function: Builtin,
        /// Input value (JSON, or a plain string), in positional order
        #[arg(long = "input", short = 'i')]
        inputs: Vec<String>,
        /// Number of declared outputs
        #[arg(long, default_value = "1")]
        outputs: usize,
        /// Run on the background worker pool
        #[arg(long)]
        parallel: bool,
        /// Worker pool size
        #[arg(long, default_value = "4")]
        workers: NonZeroUsize,
        /// Persist outputs as JSON files in this directory
        #[arg(long)]
        state_dir: Option<PathBuf>,
    },
    /// List built-in functions
    Functions,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Builtin {
    /// Product of all inputs
    Multiply,
    /// Sum of all inputs
    Add,
    /// Product of all inputs and half of it
    Split,
    /// Every input unchanged
    Identity,
}

impl Builtin {
    fn describe(self) -> &'static str {
        match self {
            Builtin::Multiply => "product of all inputs (1 result)",
            Builtin::Add => "sum of all inputs (1 result)",
            Builtin::Split => "product and half of the product (2 results)",
            Builtin::Identity => "every input unchanged (1 result per input)",
        }
    }

    fn call(self, args: &[Value]) -> Result<TaskOutput> {
        match self {
            Builtin::Multiply => Ok(product(args)?.into()),
            Builtin::Add => Ok(sum(args)?.into()),
            Builtin::Split => {
                let product = product(args)?;
                let half = halve(&product)?;
                Ok((product, half).into())
            }
            Builtin::Identity => Ok(args.to_vec().into()),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { function, inputs, outputs, parallel, workers, state_dir } => {
            let config = SchedulerConfig::new()
                .with_parallel_execution(parallel)
                .with_max_workers(workers);
            let scheduler = Scheduler::new(config)?;

            let input_handles: Vec<SharedHandle> = inputs
                .iter()
                .enumerate()
                .map(|(i, raw)| InMemoryDataHandle::shared(format!("input{}", i), Scope::Pipeline, parse_value(raw)))
                .collect();
            let output_handles = (0..outputs)
                .map(|i| open_output(state_dir.as_deref(), i))
                .collect::<Result<Vec<_>>>()?;

            let task = Task::new(
                format!("{:?}", function).to_lowercase(),
                input_handles,
                move |args| function.call(args),
                output_handles.clone(),
            )?;

            let submission = scheduler.submit(Arc::new(task))?;
            info!("Submitted {} as {}", submission.task_name(), submission.id());

            let report = submission
                .blocking_wait()
                .context("scheduler stopped before the task ran")?;
            scheduler.shutdown();

            println!("Task {} ({})", report.task_name, report.state);
            for handle in &output_handles {
                println!("  {} = {}", handle.id(), handle.read());
            }
            for err in &report.errors {
                println!("  error: {}", err);
            }
        }
        Commands::Functions => {
            for builtin in Builtin::value_variants() {
                println!("  {:<10} {}", format!("{:?}", builtin).to_lowercase(), builtin.describe());
            }
        }
    }

    Ok(())
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn open_output(state_dir: Option<&std::path::Path>, index: usize) -> Result<SharedHandle> {
    let id = format!("output{}", index);
    match state_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            let path = dir.join(format!("{}.json", id));
            JsonFileDataHandle::open_shared(id, Scope::Pipeline, &path, json!(0))
                .with_context(|| format!("failed to open {}", path.display()))
        }
        None => Ok(InMemoryDataHandle::shared(id, Scope::Pipeline, json!(0))),
    }
}

fn integers(args: &[Value]) -> Option<Vec<i64>> {
    args.iter().map(Value::as_i64).collect()
}

fn floats(args: &[Value]) -> Result<Vec<f64>> {
    args.iter()
        .map(|v| v.as_f64().with_context(|| format!("{} is not a number", v)))
        .collect()
}

fn product(args: &[Value]) -> Result<Value> {
    if let Some(ints) = integers(args) {
        let product = ints
            .iter()
            .try_fold(1i64, |acc, n| acc.checked_mul(*n))
            .context("integer overflow")?;
        return Ok(json!(product));
    }
    Ok(json!(floats(args)?.iter().product::<f64>()))
}

fn sum(args: &[Value]) -> Result<Value> {
    if let Some(ints) = integers(args) {
        let sum = ints
            .iter()
            .try_fold(0i64, |acc, n| acc.checked_add(*n))
            .context("integer overflow")?;
        return Ok(json!(sum));
    }
    Ok(json!(floats(args)?.iter().sum::<f64>()))
}

fn halve(value: &Value) -> Result<Value> {
    match value.as_i64() {
        Some(n) if n % 2 == 0 => Ok(json!(n / 2)),
        _ => {
            let n = value.as_f64().with_context(|| format!("{} is not a number", value))?;
            Ok(json!(n / 2.0))
        }
    }
}
