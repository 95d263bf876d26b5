use super::context::ExecutionContext;
use super::element::WindowedValue;
use super::receiver::OutputTag;
use super::wiring::Emitter;
use crate::error::GraphResult;

/// A single stage in an operation graph
///
/// Concrete operations implement [`process`](Operation::process) and, when
/// they produce more than one output, [`num_outputs`](Operation::num_outputs)
/// and [`output_index`](Operation::output_index). The lifecycle itself
/// (started/finished flags, context capture, propagation to consumers) is
/// owned by [`OperationGraph`](super::OperationGraph); the hooks below only
/// observe it.
///
/// # Example
/// ```
/// use opgraph::error::GraphResult;
/// use opgraph::graph::{Emitter, Operation, WindowedValue};
///
/// struct Uppercase;
///
/// impl Operation<String> for Uppercase {
///     fn name(&self) -> &str {
///         "Uppercase"
///     }
///
///     fn process(
///         &mut self,
///         elem: WindowedValue<String>,
///         out: &mut Emitter<'_, String>,
///     ) -> GraphResult<()> {
///         let upper = elem.value().to_uppercase();
///         out.emit_main(elem.with_value(upper))
///     }
/// }
/// ```
pub trait Operation<T>: Send {
    /// Name used in logs, errors and reports
    fn name(&self) -> &str;

    /// Number of output slots; fixed for the operation's lifetime
    fn num_outputs(&self) -> usize {
        1
    }

    /// Resolve an output tag to a slot index
    ///
    /// Single-output operations ignore the tag. Returns `None` when the tag
    /// names no output of this operation.
    fn output_index(&self, _tag: &OutputTag) -> Option<usize> {
        Some(0)
    }

    /// Process one element, emitting zero or more elements through `out`
    ///
    /// Failures (including [`GraphError::Io`](crate::error::GraphError::Io)
    /// and [`GraphError::Interrupted`](crate::error::GraphError::Interrupted))
    /// must be returned as-is; the graph never catches or retries them.
    fn process(&mut self, elem: WindowedValue<T>, out: &mut Emitter<'_, T>) -> GraphResult<()>;

    /// Called once, when the operation is first started and before its consumers are
    fn on_start(&mut self, _context: &ExecutionContext) -> GraphResult<()> {
        Ok(())
    }

    /// Called once, when the operation is first finished and before its consumers are
    fn on_finish(&mut self) -> GraphResult<()> {
        Ok(())
    }
}

/// Observable lifecycle state of one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Started,
    Finished,
}

impl LifecycleState {
    pub(crate) fn from_flags(started: bool, finished: bool) -> Self {
        match (started, finished) {
            (_, true) => LifecycleState::Finished,
            (true, false) => LifecycleState::Started,
            (false, false) => LifecycleState::Uninitialized,
        }
    }
}
