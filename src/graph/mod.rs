//! Operation graph with an explicit start/process/finish lifecycle
//!
//! A task builds an [`OperationGraph`] by adding operations and wiring each
//! producer output (selected by an [`OutputTag`]) to its consumers. Execution
//! then follows a fixed order:
//!
//! 1. `start` on the entry operations, which starts everything downstream
//! 2. `process` once per element; emission delivers synchronously to consumers
//! 3. `finish` on the entry operations, which finishes everything downstream
//!
//! `start` and `finish` are idempotent per operation, so a consumer reachable
//! along several paths is started and finished exactly once.
//! [`TaskRunner`] drives the whole sequence for one task.
//!
//! # Example
//! ```
//! use opgraph::graph::operations::{CollectSink, MapOperation};
//! use opgraph::graph::{ExecutionContext, OperationGraph, OutputTag, TaskRunner, WindowedValue};
//!
//! let mut graph = OperationGraph::<i32>::new();
//! let square = graph.add_operation(MapOperation::new("square", |v: &i32| v * v));
//! let (sink, collected) = CollectSink::new("sink");
//! let sink = graph.add_operation(sink);
//! graph.attach_consumer(square, &OutputTag::main(), sink)?;
//!
//! let mut runner = TaskRunner::builder("squares")
//!     .graph(graph)
//!     .context(ExecutionContext::new("task-1"))
//!     .build()?;
//! runner.run(square, [1, 2, 3].map(WindowedValue::in_global_window))?;
//!
//! assert_eq!(collected.values(), vec![1, 4, 9]);
//! # Ok::<(), opgraph::error::GraphError>(())
//! ```

pub mod context;
pub mod element;
pub mod executor;
pub mod operation;
pub mod operations;
pub mod receiver;
pub mod wiring;

// Re-export main types
pub use context::ExecutionContext;
pub use element::{PaneInfo, PaneTiming, Window, WindowedValue};
pub use executor::{TaskReport, TaskRunner, TaskRunnerBuilder};
pub use operation::{LifecycleState, Operation};
pub use receiver::{OperationId, OutputReceiver, OutputTag};
pub use wiring::{Emitter, OperationGraph};
