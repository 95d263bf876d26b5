use super::context::ExecutionContext;
use super::element::WindowedValue;
use super::receiver::OperationId;
use super::wiring::OperationGraph;
use crate::error::{GraphError, GraphResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Result of one task execution
#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    /// Task name
    pub task_name: String,

    /// Identifier of this run, for correlating log lines
    pub run_id: Uuid,

    /// Whether every element was processed and the graph finished
    pub success: bool,

    /// Elements fully processed by the entry operation
    pub elements_processed: u64,

    /// Total duration
    pub duration: Duration,

    /// Error message if failed
    pub error: Option<String>,

    /// Whether the failure was a cooperative interruption
    pub interrupted: bool,

    /// Context counters at the end of the run
    pub counters: BTreeMap<String, u64>,
}

impl TaskReport {
    fn success(
        task_name: impl Into<String>,
        run_id: Uuid,
        elements_processed: u64,
        duration: Duration,
        counters: BTreeMap<String, u64>,
    ) -> Self {
        Self {
            task_name: task_name.into(),
            run_id,
            success: true,
            elements_processed,
            duration,
            error: None,
            interrupted: false,
            counters,
        }
    }

    fn failure(
        task_name: impl Into<String>,
        run_id: Uuid,
        elements_processed: u64,
        cause: &GraphError,
        duration: Duration,
        counters: BTreeMap<String, u64>,
    ) -> Self {
        Self {
            task_name: task_name.into(),
            run_id,
            success: false,
            elements_processed,
            duration,
            error: Some(cause.to_string()),
            interrupted: cause.is_interruption(),
            counters,
        }
    }
}

/// Host driver for one task: start once, process many, finish once
///
/// Before running, the graph is checked for cycles. Every entry point (an
/// operation nothing feeds) is started with the shared context, which
/// starts the whole graph. Elements are then fed to the chosen entry
/// operation, and finally every entry point is finished.
///
/// A failing element stops the feed and yields a failed [`TaskReport`]; the
/// graph is left as it was (started, not finished). Failures while starting
/// or finishing are returned as `Err`.
///
/// # Example
/// ```
/// use opgraph::graph::operations::{CountingSink, PassThrough};
/// use opgraph::graph::{ExecutionContext, OperationGraph, OutputTag, TaskRunner, WindowedValue};
///
/// let mut graph = OperationGraph::new();
/// let source = graph.add_operation(PassThrough::new("source"));
/// let (sink, count) = CountingSink::new("sink");
/// let sink = graph.add_operation(sink);
/// graph.attach_consumer(source, &OutputTag::main(), sink).unwrap();
///
/// let mut runner = TaskRunner::builder("word-count")
///     .graph(graph)
///     .context(ExecutionContext::new("task-0"))
///     .build()
///     .unwrap();
/// let report = runner
///     .run(source, (0..3u32).map(WindowedValue::in_global_window))
///     .unwrap();
///
/// assert!(report.success);
/// assert_eq!(report.elements_processed, 3);
/// assert_eq!(count.count(), 3);
/// ```
pub struct TaskRunner<T> {
    name: String,
    graph: OperationGraph<T>,
    context: Arc<ExecutionContext>,
}

impl<T> TaskRunner<T> {
    /// Create a new task runner builder
    pub fn builder(name: impl Into<String>) -> TaskRunnerBuilder<T> {
        TaskRunnerBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn graph(&self) -> &OperationGraph<T> {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut OperationGraph<T> {
        &mut self.graph
    }

    pub fn context(&self) -> &Arc<ExecutionContext> {
        &self.context
    }

    /// Execute the task, feeding `elements` to `entry`
    pub fn run<I>(&mut self, entry: OperationId, elements: I) -> GraphResult<TaskReport>
    where
        I: IntoIterator<Item = WindowedValue<T>>,
    {
        let run_id = Uuid::new_v4();
        let task_start = Instant::now();

        let order = self.graph.validate_acyclic()?;
        let entry_name = self.graph.name(entry)?.to_string();
        let entry_points = self.graph.entry_points();

        info!(
            task = %self.name,
            run_id = %run_id,
            task_id = self.context.task_id(),
            operations = order.len(),
            entry_points = entry_points.len(),
            entry = %entry_name,
            "starting task"
        );

        for id in &entry_points {
            self.graph.start(*id, Arc::clone(&self.context))?;
        }
        if !self.graph.is_started(entry)? {
            warn!(task = %self.name, entry = %entry_name, "entry operation not reachable from any entry point");
        }

        let mut processed = 0u64;
        for elem in elements {
            if let Err(e) = self.graph.process(entry, elem) {
                error!(
                    task = %self.name,
                    run_id = %run_id,
                    entry = %entry_name,
                    processed,
                    error = %e,
                    "element processing failed"
                );
                return Ok(TaskReport::failure(
                    &self.name,
                    run_id,
                    processed,
                    &e,
                    task_start.elapsed(),
                    self.context.counters()?,
                ));
            }
            processed += 1;
        }

        for id in &entry_points {
            self.graph.finish(*id)?;
        }

        let duration = task_start.elapsed();
        info!(
            task = %self.name,
            run_id = %run_id,
            processed,
            "task completed in {:.2}s",
            duration.as_secs_f64()
        );

        Ok(TaskReport::success(
            &self.name,
            run_id,
            processed,
            duration,
            self.context.counters()?,
        ))
    }
}

/// Builder for constructing task runners
pub struct TaskRunnerBuilder<T> {
    name: String,
    graph: Option<OperationGraph<T>>,
    context: Option<Arc<ExecutionContext>>,
}

impl<T> TaskRunnerBuilder<T> {
    /// Create a new task runner builder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            graph: None,
            context: None,
        }
    }

    /// Set the wired operation graph
    pub fn graph(mut self, graph: OperationGraph<T>) -> Self {
        self.graph = Some(graph);
        self
    }

    /// Set the execution context
    pub fn context(mut self, context: ExecutionContext) -> Self {
        self.context = Some(Arc::new(context));
        self
    }

    /// Set an execution context that is already shared
    pub fn shared_context(mut self, context: Arc<ExecutionContext>) -> Self {
        self.context = Some(context);
        self
    }

    /// Build the task runner
    ///
    /// # Errors
    /// Returns `GraphError::BuilderError` if the graph or context is missing
    pub fn build(self) -> GraphResult<TaskRunner<T>> {
        let graph = self
            .graph
            .ok_or_else(|| GraphError::BuilderError("graph is required".to_string()))?;
        let context = self
            .context
            .ok_or_else(|| GraphError::BuilderError("context is required".to_string()))?;
        Ok(TaskRunner {
            name: self.name,
            graph,
            context,
        })
    }
}
