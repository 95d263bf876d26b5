use crate::error::GraphResult;
use crate::graph::{Emitter, Operation, WindowedValue};

/// Operation that replaces each element's value with `f(value)`
///
/// Timestamp, windows and pane are carried over to the emitted element.
///
/// # Example
/// ```
/// use opgraph::graph::operations::MapOperation;
/// use opgraph::graph::OperationGraph;
///
/// let mut graph = OperationGraph::<i64>::new();
/// graph.add_operation(MapOperation::new("double", |v: &i64| v * 2));
/// ```
pub struct MapOperation<F> {
    name: String,
    f: F,
}

impl<F> MapOperation<F> {
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<T, F> Operation<T> for MapOperation<F>
where
    T: Clone,
    F: FnMut(&T) -> T + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&mut self, elem: WindowedValue<T>, out: &mut Emitter<'_, T>) -> GraphResult<()> {
        let mapped = (self.f)(elem.value());
        out.emit_main(elem.with_value(mapped))
    }
}

/// Operation that emits only the elements whose value matches a predicate
pub struct FilterOperation<F> {
    name: String,
    predicate: F,
    dropped: u64,
}

impl<F> FilterOperation<F> {
    pub fn new(name: impl Into<String>, predicate: F) -> Self {
        Self {
            name: name.into(),
            predicate,
            dropped: 0,
        }
    }
}

impl<T, F> Operation<T> for FilterOperation<F>
where
    T: Clone,
    F: FnMut(&T) -> bool + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&mut self, elem: WindowedValue<T>, out: &mut Emitter<'_, T>) -> GraphResult<()> {
        if (self.predicate)(elem.value()) {
            out.emit_main(elem)
        } else {
            self.dropped += 1;
            Ok(())
        }
    }

    fn on_finish(&mut self) -> GraphResult<()> {
        tracing::debug!(operation = %self.name, dropped = self.dropped, "filter finished");
        Ok(())
    }
}
