use crate::error::GraphResult;
use crate::graph::{Emitter, Operation, WindowedValue};
use tracing::trace;

/// Operation that re-emits every element unchanged on its single output
///
/// Useful as an explicit entry point that fans out to several consumers.
///
/// # Example
/// ```
/// use opgraph::graph::operations::PassThrough;
/// use opgraph::graph::OperationGraph;
///
/// let mut graph: OperationGraph<String> = OperationGraph::new();
/// let root = graph.add_operation(PassThrough::new("root"));
/// assert_eq!(graph.name(root).unwrap(), "root");
/// ```
pub struct PassThrough {
    name: String,
}

impl PassThrough {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for PassThrough {
    fn default() -> Self {
        Self::new("Pass Through")
    }
}

impl<T: Clone> Operation<T> for PassThrough {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&mut self, elem: WindowedValue<T>, out: &mut Emitter<'_, T>) -> GraphResult<()> {
        trace!(operation = %self.name, "forwarding element");
        out.emit_main(elem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::operations::CollectSink;
    use crate::graph::{ExecutionContext, OperationGraph, OutputTag};
    use std::sync::Arc;

    #[test]
    fn test_pass_through_forwards_unchanged() {
        let mut graph = OperationGraph::new();
        let root = graph.add_operation(PassThrough::default());
        let (sink, collected) = CollectSink::new("sink");
        let sink = graph.add_operation(sink);
        graph.attach_consumer(root, &OutputTag::main(), sink).unwrap();

        graph
            .start(root, Arc::new(ExecutionContext::new("task-1")))
            .unwrap();
        let elem = WindowedValue::in_global_window("hello".to_string());
        graph.process(root, elem.clone()).unwrap();

        assert_eq!(collected.elements(), vec![elem]);
    }

    #[test]
    fn test_pass_through_without_consumers() {
        let mut graph = OperationGraph::new();
        let root = graph.add_operation(PassThrough::new("lonely"));
        graph
            .start(root, Arc::new(ExecutionContext::new("task-1")))
            .unwrap();

        graph
            .process(root, WindowedValue::in_global_window(1))
            .unwrap();
        assert!(graph.output_receivers(root).unwrap()[0].is_empty());
    }
}
