use crate::error::{GraphError, GraphResult};
use crate::graph::{Emitter, Operation, OutputTag, WindowedValue};

/// Multi-output operation routing each element to one tagged output
///
/// Each declared tag owns one output slot, in declaration order. The router
/// closure picks the tag for every element; a tag that was not declared fails
/// the element with [`GraphError::InvalidOutputTag`].
///
/// # Example
/// ```
/// use opgraph::graph::operations::{CollectSink, PartitionOperation};
/// use opgraph::graph::{OperationGraph, OutputTag};
///
/// let mut graph = OperationGraph::<i32>::new();
/// let split = graph.add_operation(PartitionOperation::new(
///     "parity",
///     vec![OutputTag::new("even"), OutputTag::new("odd")],
///     |v: &i32| OutputTag::new(if v % 2 == 0 { "even" } else { "odd" }),
/// ));
/// let (odd_sink, _odd) = CollectSink::new("odd-sink");
/// let odd_sink = graph.add_operation(odd_sink);
/// graph.attach_consumer(split, &OutputTag::new("odd"), odd_sink).unwrap();
///
/// let receivers = graph.output_receivers(split).unwrap();
/// assert!(receivers[0].is_empty());
/// assert_eq!(receivers[1].receiving_operations(), &[odd_sink]);
/// ```
pub struct PartitionOperation<F> {
    name: String,
    tags: Vec<OutputTag>,
    router: F,
}

impl<F> PartitionOperation<F> {
    pub fn new(name: impl Into<String>, tags: Vec<OutputTag>, router: F) -> Self {
        Self {
            name: name.into(),
            tags,
            router,
        }
    }

    /// Declared output tags in slot order
    pub fn tags(&self) -> &[OutputTag] {
        &self.tags
    }

    fn slot_of(&self, tag: &OutputTag) -> Option<usize> {
        self.tags.iter().position(|declared| declared == tag)
    }
}

impl<T, F> Operation<T> for PartitionOperation<F>
where
    T: Clone,
    F: FnMut(&T) -> OutputTag + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn num_outputs(&self) -> usize {
        self.tags.len()
    }

    fn output_index(&self, tag: &OutputTag) -> Option<usize> {
        self.slot_of(tag)
    }

    fn process(&mut self, elem: WindowedValue<T>, out: &mut Emitter<'_, T>) -> GraphResult<()> {
        let tag = (self.router)(elem.value());
        let slot = self
            .slot_of(&tag)
            .ok_or_else(|| GraphError::InvalidOutputTag {
                operation: self.name.clone(),
                tag: tag.to_string(),
            })?;
        out.emit(slot, elem)
    }
}
