use super::context::ExecutionContext;
use super::element::WindowedValue;
use super::operation::{LifecycleState, Operation};
use super::receiver::{OperationId, OutputReceiver, OutputTag};
use crate::config::GraphConfig;
use crate::error::{GraphError, GraphResult};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// One arena slot: the operation plus the lifecycle state the graph keeps for it
struct Node<T> {
    /// `None` only while the operation is inside its own `process` call
    operation: Option<Box<dyn Operation<T>>>,
    name: String,
    receivers: Vec<OutputReceiver>,
    context: Option<Arc<ExecutionContext>>,
    started: bool,
    finished: bool,
}

/// Arena of operations wired into a DAG
///
/// Operations are addressed by [`OperationId`]; receivers hold ids, so a
/// consumer shared by several producers is owned exactly once. `start` and
/// `finish` propagate downstream along every receiver and are idempotent per
/// node, which is what keeps diamond-shaped graphs from starting or finishing
/// a shared consumer twice.
///
/// # Example
/// ```
/// use opgraph::graph::operations::{CountingSink, PassThrough};
/// use opgraph::graph::{ExecutionContext, OperationGraph, OutputTag, WindowedValue};
/// use std::sync::Arc;
///
/// let mut graph = OperationGraph::new();
/// let source = graph.add_operation(PassThrough::new("source"));
/// let (sink, count) = CountingSink::new("sink");
/// let sink = graph.add_operation(sink);
/// graph.attach_consumer(source, &OutputTag::main(), sink).unwrap();
///
/// graph.start(source, Arc::new(ExecutionContext::new("task-1"))).unwrap();
/// graph.process(source, WindowedValue::in_global_window(1u64)).unwrap();
/// graph.finish(source).unwrap();
///
/// assert_eq!(count.count(), 1);
/// ```
pub struct OperationGraph<T> {
    nodes: Vec<Node<T>>,
    config: GraphConfig,
    /// Set once any operation has been started
    sealed: bool,
}

impl<T> Default for OperationGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OperationGraph<T> {
    /// Create an empty graph with the default (strict) configuration
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    /// Create an empty graph with an explicit configuration
    pub fn with_config(config: GraphConfig) -> Self {
        Self {
            nodes: Vec::new(),
            config,
            sealed: false,
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Add an operation, allocating one empty receiver per declared output
    pub fn add_operation<O: Operation<T> + 'static>(&mut self, operation: O) -> OperationId {
        self.add_boxed_operation(Box::new(operation))
    }

    /// Add a boxed operation
    pub fn add_boxed_operation(&mut self, operation: Box<dyn Operation<T>>) -> OperationId {
        let id = OperationId(self.nodes.len());
        let name = operation.name().to_string();
        let receivers = vec![OutputReceiver::new(); operation.num_outputs()];
        debug!(operation = %name, id = %id, outputs = receivers.len(), "operation added");
        self.nodes.push(Node {
            operation: Some(operation),
            name,
            receivers,
            context: None,
            started: false,
            finished: false,
        });
        id
    }

    /// Register `consumer` on the output of `producer` selected by `tag`
    ///
    /// The tag is resolved by the producer's
    /// [`output_index`](Operation::output_index). Consumers are appended;
    /// nothing is ever removed or deduplicated. Cycles are not checked here,
    /// see [`validate_acyclic`](Self::validate_acyclic).
    pub fn attach_consumer(
        &mut self,
        producer: OperationId,
        tag: &OutputTag,
        consumer: OperationId,
    ) -> GraphResult<()> {
        self.node(consumer)?;
        if self.sealed && self.config.is_strict() {
            return Err(GraphError::WiringAfterStart(format!(
                "{} -> {}",
                self.node(producer)?.name,
                self.node(consumer)?.name
            )));
        }

        let node = self.node_mut(producer)?;
        let operation = node
            .operation
            .as_ref()
            .ok_or_else(|| GraphError::ReentrantProcess(node.name.clone()))?;
        let slot = operation
            .output_index(tag)
            .filter(|slot| *slot < node.receivers.len())
            .ok_or_else(|| GraphError::InvalidOutputTag {
                operation: node.name.clone(),
                tag: tag.to_string(),
            })?;

        node.receivers[slot].add_output(consumer);
        debug!(
            producer = %producer,
            consumer = %consumer,
            tag = %tag,
            slot,
            "consumer attached"
        );
        Ok(())
    }

    /// Start `id` and, transitively, every operation downstream of it
    ///
    /// The first call marks the operation started, captures `context`, runs
    /// its `on_start` hook and then starts each consumer in receiver order.
    /// Later calls are no-ops. A hook failure stops propagation; operations
    /// already visited stay started and the graph stays sealed.
    pub fn start(&mut self, id: OperationId, context: Arc<ExecutionContext>) -> GraphResult<()> {
        if self.node(id)?.started {
            return Ok(());
        }
        self.sealed = true;
        let node = self.node_mut(id)?;
        node.started = true;
        node.context = Some(Arc::clone(&context));
        debug!(operation = %node.name, id = %id, task = context.task_id(), "starting operation");
        if let Some(operation) = node.operation.as_mut() {
            operation.on_start(&context)?;
        }

        for consumer in self.consumers_of(id)? {
            self.start(consumer, Arc::clone(&context))?;
        }
        Ok(())
    }

    /// Deliver one element to `id`
    ///
    /// Emission inside the operation synchronously processes the element in
    /// every consumer, depth-first, in registration order. Errors propagate
    /// unchanged.
    pub fn process(&mut self, id: OperationId, elem: WindowedValue<T>) -> GraphResult<()> {
        self.process_at(id, elem, 0)
    }

    /// Finish `id` and, transitively, every operation downstream of it
    ///
    /// Mirrors [`start`](Self::start): the first call marks the operation
    /// finished, runs `on_finish` and finishes each consumer; later calls are
    /// no-ops. Under the strict policy an operation that was never started
    /// cannot be finished.
    pub fn finish(&mut self, id: OperationId) -> GraphResult<()> {
        let strict = self.config.is_strict();
        let node = self.node_mut(id)?;
        if node.finished {
            return Ok(());
        }
        if strict && !node.started {
            return Err(GraphError::NotStarted(node.name.clone()));
        }
        node.finished = true;
        debug!(operation = %node.name, id = %id, "finishing operation");
        if let Some(operation) = node.operation.as_mut() {
            operation.on_finish()?;
        }

        for consumer in self.consumers_of(id)? {
            self.finish(consumer)?;
        }
        Ok(())
    }

    /// Snapshot of every receiver of `id`, empty ones included
    pub fn output_receivers(&self, id: OperationId) -> GraphResult<Vec<OutputReceiver>> {
        Ok(self.node(id)?.receivers.clone())
    }

    pub fn is_started(&self, id: OperationId) -> GraphResult<bool> {
        Ok(self.node(id)?.started)
    }

    pub fn is_finished(&self, id: OperationId) -> GraphResult<bool> {
        Ok(self.node(id)?.finished)
    }

    pub fn state(&self, id: OperationId) -> GraphResult<LifecycleState> {
        let node = self.node(id)?;
        Ok(LifecycleState::from_flags(node.started, node.finished))
    }

    /// Context captured when `id` was started
    pub fn context(&self, id: OperationId) -> GraphResult<Option<Arc<ExecutionContext>>> {
        Ok(self.node(id)?.context.clone())
    }

    pub fn name(&self, id: OperationId) -> GraphResult<&str> {
        Ok(&self.node(id)?.name)
    }

    pub fn operation_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn operation_ids(&self) -> impl Iterator<Item = OperationId> {
        (0..self.nodes.len()).map(OperationId)
    }

    /// Operations with a receiver slot that delivers to `id`, in id order
    pub fn producers(&self, id: OperationId) -> GraphResult<Vec<OperationId>> {
        self.node(id)?;
        Ok(self
            .operation_ids()
            .filter(|producer| {
                self.nodes[producer.0]
                    .receivers
                    .iter()
                    .any(|r| r.receiving_operations().contains(&id))
            })
            .collect())
    }

    /// Operations nothing in the graph feeds
    pub fn entry_points(&self) -> Vec<OperationId> {
        let mut fed = vec![false; self.nodes.len()];
        for node in &self.nodes {
            for receiver in &node.receivers {
                for consumer in receiver.receiving_operations() {
                    fed[consumer.0] = true;
                }
            }
        }
        self.operation_ids().filter(|id| !fed[id.0]).collect()
    }

    /// Topological order of the graph, or the operations left on a cycle
    pub fn validate_acyclic(&self) -> GraphResult<Vec<OperationId>> {
        let mut in_degree = vec![0usize; self.nodes.len()];
        for node in &self.nodes {
            for receiver in &node.receivers {
                for consumer in receiver.receiving_operations() {
                    in_degree[consumer.0] += 1;
                }
            }
        }

        let mut ready: VecDeque<OperationId> = self
            .operation_ids()
            .filter(|id| in_degree[id.0] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(id) = ready.pop_front() {
            order.push(id);
            for receiver in &self.nodes[id.0].receivers {
                for consumer in receiver.receiving_operations() {
                    in_degree[consumer.0] -= 1;
                    if in_degree[consumer.0] == 0 {
                        ready.push_back(*consumer);
                    }
                }
            }
        }

        if order.len() == self.nodes.len() {
            Ok(order)
        } else {
            let remaining = (0..self.nodes.len())
                .filter(|index| in_degree[*index] > 0)
                .collect();
            Err(GraphError::CycleDetected(remaining))
        }
    }

    fn node(&self, id: OperationId) -> GraphResult<&Node<T>> {
        self.nodes
            .get(id.0)
            .ok_or(GraphError::UnknownOperation(id.0))
    }

    fn node_mut(&mut self, id: OperationId) -> GraphResult<&mut Node<T>> {
        self.nodes
            .get_mut(id.0)
            .ok_or(GraphError::UnknownOperation(id.0))
    }

    fn consumers_of(&self, id: OperationId) -> GraphResult<Vec<OperationId>> {
        Ok(self
            .node(id)?
            .receivers
            .iter()
            .flat_map(|r| r.receiving_operations().iter().copied())
            .collect())
    }

    fn process_at(
        &mut self,
        id: OperationId,
        elem: WindowedValue<T>,
        depth: usize,
    ) -> GraphResult<()> {
        let strict = self.config.is_strict();
        let max_depth = self.config.max_depth;
        let node = self.node_mut(id)?;
        if depth >= max_depth {
            return Err(GraphError::DepthExceeded {
                operation: node.name.clone(),
                max_depth,
            });
        }
        if strict {
            if !node.started {
                return Err(GraphError::NotStarted(node.name.clone()));
            }
            if node.finished {
                return Err(GraphError::AlreadyFinished(node.name.clone()));
            }
        }

        let mut operation = node
            .operation
            .take()
            .ok_or_else(|| GraphError::ReentrantProcess(node.name.clone()))?;
        let context = node.context.clone();

        let result = {
            let mut out = Emitter {
                graph: self,
                source: id,
                depth,
                context,
            };
            operation.process(elem, &mut out)
        };

        // Restore before surfacing any error so the graph stays inspectable.
        self.nodes[id.0].operation = Some(operation);
        result
    }
}

/// Output side of an operation during one `process` call
///
/// Emitting on a slot delivers the element to every consumer registered on
/// that slot before `emit` returns.
pub struct Emitter<'a, T> {
    graph: &'a mut OperationGraph<T>,
    source: OperationId,
    depth: usize,
    context: Option<Arc<ExecutionContext>>,
}

impl<T> Emitter<'_, T> {
    /// Id of the operation doing the emitting
    pub fn source(&self) -> OperationId {
        self.source
    }

    /// Number of output slots of the emitting operation
    pub fn num_outputs(&self) -> usize {
        self.graph.nodes[self.source.0].receivers.len()
    }

    /// Context captured when the emitting operation started
    pub fn context(&self) -> GraphResult<&ExecutionContext> {
        self.context
            .as_deref()
            .ok_or_else(|| GraphError::NotStarted(self.graph.nodes[self.source.0].name.clone()))
    }
}

impl<T: Clone> Emitter<'_, T> {
    /// Emit on output slot 0
    pub fn emit_main(&mut self, elem: WindowedValue<T>) -> GraphResult<()> {
        self.emit(0, elem)
    }

    /// Emit on output slot `slot`, delivering to each consumer in registration order
    pub fn emit(&mut self, slot: usize, elem: WindowedValue<T>) -> GraphResult<()> {
        let source = &self.graph.nodes[self.source.0];
        let fan_out = source
            .receivers
            .get(slot)
            .ok_or_else(|| GraphError::InvalidOutputTag {
                operation: source.name.clone(),
                tag: format!("slot {}", slot),
            })?
            .len();

        // Receivers cannot change while the graph is mutably borrowed here.
        let mut elem = Some(elem);
        for i in 0..fan_out {
            let consumer = self.graph.nodes[self.source.0].receivers[slot].receiving_operations()[i];
            let delivered = if i + 1 == fan_out {
                elem.take()
            } else {
                elem.clone()
            };
            if let Some(delivered) = delivered {
                self.graph.process_at(consumer, delivered, self.depth + 1)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LifecyclePolicy;
    use std::sync::Mutex;

    type Events = Arc<Mutex<Vec<String>>>;

    /// Forwards every element and records each lifecycle call
    struct Recorder {
        name: String,
        events: Events,
    }

    impl Recorder {
        fn new(name: &str, events: &Events) -> Self {
            Self {
                name: name.to_string(),
                events: Arc::clone(events),
            }
        }

        fn record(&self, event: &str) {
            self.events
                .lock()
                .unwrap()
                .push(format!("{}:{}", event, self.name));
        }
    }

    impl Operation<i32> for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        fn process(&mut self, elem: WindowedValue<i32>, out: &mut Emitter<'_, i32>) -> GraphResult<()> {
            self.record(&format!("process({})", elem.value()));
            out.emit_main(elem)
        }

        fn on_start(&mut self, _context: &ExecutionContext) -> GraphResult<()> {
            self.record("start");
            Ok(())
        }

        fn on_finish(&mut self) -> GraphResult<()> {
            self.record("finish");
            Ok(())
        }
    }

    fn context() -> Arc<ExecutionContext> {
        Arc::new(ExecutionContext::new("task-test"))
    }

    fn events_of(events: &Events) -> Vec<String> {
        events.lock().unwrap().clone()
    }

    #[test]
    fn test_start_propagates_down_chain_in_order() {
        let events = Events::default();
        let mut graph = OperationGraph::new();
        let a = graph.add_operation(Recorder::new("a", &events));
        let b = graph.add_operation(Recorder::new("b", &events));
        let c = graph.add_operation(Recorder::new("c", &events));
        graph.attach_consumer(a, &OutputTag::main(), b).unwrap();
        graph.attach_consumer(b, &OutputTag::main(), c).unwrap();

        graph.start(a, context()).unwrap();

        assert_eq!(events_of(&events), vec!["start:a", "start:b", "start:c"]);
        for id in [a, b, c] {
            assert!(graph.is_started(id).unwrap());
            assert!(graph.context(id).unwrap().is_some());
        }
    }

    #[test]
    fn test_start_is_idempotent() {
        let events = Events::default();
        let mut graph = OperationGraph::new();
        let a = graph.add_operation(Recorder::new("a", &events));
        let b = graph.add_operation(Recorder::new("b", &events));
        graph.attach_consumer(a, &OutputTag::main(), b).unwrap();

        let first = context();
        graph.start(a, Arc::clone(&first)).unwrap();
        graph.start(a, Arc::new(ExecutionContext::new("other"))).unwrap();

        assert_eq!(events_of(&events), vec!["start:a", "start:b"]);
        assert_eq!(graph.context(b).unwrap().unwrap().task_id(), "task-test");
    }

    #[test]
    fn test_finish_is_idempotent_and_shared_consumer_finishes_once() {
        let events = Events::default();
        let mut graph = OperationGraph::new();
        let a = graph.add_operation(Recorder::new("a", &events));
        let b = graph.add_operation(Recorder::new("b", &events));
        let c = graph.add_operation(Recorder::new("c", &events));
        let d = graph.add_operation(Recorder::new("d", &events));
        graph.attach_consumer(a, &OutputTag::main(), b).unwrap();
        graph.attach_consumer(a, &OutputTag::main(), c).unwrap();
        graph.attach_consumer(b, &OutputTag::main(), d).unwrap();
        graph.attach_consumer(c, &OutputTag::main(), d).unwrap();

        graph.start(a, context()).unwrap();
        events.lock().unwrap().clear();

        graph.finish(a).unwrap();
        graph.finish(a).unwrap();

        assert_eq!(
            events_of(&events),
            vec!["finish:a", "finish:b", "finish:d", "finish:c"]
        );
        assert_eq!(graph.state(d).unwrap(), LifecycleState::Finished);
    }

    #[test]
    fn test_attach_appends_in_order() {
        let events = Events::default();
        let mut graph = OperationGraph::new();
        let p = graph.add_operation(Recorder::new("p", &events));
        let x = graph.add_operation(Recorder::new("x", &events));
        let y = graph.add_operation(Recorder::new("y", &events));
        graph.attach_consumer(p, &OutputTag::main(), x).unwrap();
        graph.attach_consumer(p, &OutputTag::new("anything"), y).unwrap();

        let receivers = graph.output_receivers(p).unwrap();
        assert_eq!(receivers.len(), 1);
        assert_eq!(receivers[0].receiving_operations(), &[x, y]);
    }

    #[test]
    fn test_unknown_operation() {
        let events = Events::default();
        let mut graph = OperationGraph::new();
        let a = graph.add_operation(Recorder::new("a", &events));

        let result = graph.attach_consumer(a, &OutputTag::main(), OperationId(9));
        assert!(matches!(result, Err(GraphError::UnknownOperation(9))));
        assert!(matches!(graph.finish(OperationId(4)), Err(GraphError::UnknownOperation(4))));
    }

    #[test]
    fn test_strict_policy_rejects_out_of_order_calls() {
        let events = Events::default();
        let mut graph = OperationGraph::new();
        let a = graph.add_operation(Recorder::new("a", &events));
        let b = graph.add_operation(Recorder::new("b", &events));

        let early = graph.process(a, WindowedValue::in_global_window(1));
        assert!(matches!(early, Err(GraphError::NotStarted(_))));
        assert!(matches!(graph.finish(a), Err(GraphError::NotStarted(_))));

        graph.start(a, context()).unwrap();
        let late_wiring = graph.attach_consumer(a, &OutputTag::main(), b);
        assert!(matches!(late_wiring, Err(GraphError::WiringAfterStart(_))));

        graph.finish(a).unwrap();
        let late = graph.process(a, WindowedValue::in_global_window(2));
        assert!(matches!(late, Err(GraphError::AlreadyFinished(_))));
    }

    #[test]
    fn test_permissive_policy_skips_checks() {
        let config = GraphConfig::builder()
            .lifecycle(LifecyclePolicy::Permissive)
            .build()
            .unwrap();
        let events = Events::default();
        let mut graph = OperationGraph::with_config(config);
        let a = graph.add_operation(Recorder::new("a", &events));

        graph.process(a, WindowedValue::in_global_window(1)).unwrap();
        graph.finish(a).unwrap();

        assert_eq!(events_of(&events), vec!["process(1):a", "finish:a"]);
        assert!(!graph.is_started(a).unwrap());
        assert!(graph.is_finished(a).unwrap());
    }

    #[test]
    fn test_cycle_detection_and_reentrancy() {
        let config = GraphConfig::builder()
            .lifecycle(LifecyclePolicy::Permissive)
            .build()
            .unwrap();
        let events = Events::default();
        let mut graph = OperationGraph::with_config(config);
        let a = graph.add_operation(Recorder::new("a", &events));
        let b = graph.add_operation(Recorder::new("b", &events));
        graph.attach_consumer(a, &OutputTag::main(), b).unwrap();
        graph.attach_consumer(b, &OutputTag::main(), a).unwrap();

        assert!(matches!(
            graph.validate_acyclic(),
            Err(GraphError::CycleDetected(ref ids)) if ids == &vec![0, 1]
        ));

        // Flags terminate lifecycle propagation even on a cycle.
        graph.start(a, context()).unwrap();
        assert!(graph.is_started(b).unwrap());

        let result = graph.process(a, WindowedValue::in_global_window(1));
        assert!(matches!(result, Err(GraphError::ReentrantProcess(ref name)) if name == "a"));
        // The operation is restored after the failure.
        let again = graph.process(b, WindowedValue::in_global_window(2));
        assert!(matches!(again, Err(GraphError::ReentrantProcess(ref name)) if name == "b"));
    }

    #[test]
    fn test_max_depth_bounds_emit_nesting() {
        let config = GraphConfig::builder().max_depth(2).build().unwrap();
        let events = Events::default();
        let mut graph = OperationGraph::with_config(config);
        let a = graph.add_operation(Recorder::new("a", &events));
        let b = graph.add_operation(Recorder::new("b", &events));
        let c = graph.add_operation(Recorder::new("c", &events));
        graph.attach_consumer(a, &OutputTag::main(), b).unwrap();
        graph.attach_consumer(b, &OutputTag::main(), c).unwrap();
        graph.start(a, context()).unwrap();

        let result = graph.process(a, WindowedValue::in_global_window(1));
        assert!(matches!(
            result,
            Err(GraphError::DepthExceeded { ref operation, max_depth: 2 }) if operation == "c"
        ));
        assert_eq!(
            events_of(&events),
            vec!["start:a", "start:b", "start:c", "process(1):a", "process(1):b"]
        );
    }

    #[test]
    fn test_max_depth_is_inclusive() {
        let config = GraphConfig::builder().max_depth(3).build().unwrap();
        let events = Events::default();
        let mut graph = OperationGraph::with_config(config);
        let a = graph.add_operation(Recorder::new("a", &events));
        let b = graph.add_operation(Recorder::new("b", &events));
        let c = graph.add_operation(Recorder::new("c", &events));
        graph.attach_consumer(a, &OutputTag::main(), b).unwrap();
        graph.attach_consumer(b, &OutputTag::main(), c).unwrap();
        graph.start(a, context()).unwrap();

        graph.process(a, WindowedValue::in_global_window(1)).unwrap();
        assert_eq!(count_of(&events, "process(1):c"), 1);
    }

    /// Records lifecycle calls like `Recorder` but fails the selected hook
    struct FailingHook {
        inner: Recorder,
        fail_start: bool,
        fail_finish: bool,
    }

    impl Operation<i32> for FailingHook {
        fn name(&self) -> &str {
            &self.inner.name
        }

        fn process(&mut self, elem: WindowedValue<i32>, out: &mut Emitter<'_, i32>) -> GraphResult<()> {
            self.inner.process(elem, out)
        }

        fn on_start(&mut self, context: &ExecutionContext) -> GraphResult<()> {
            self.inner.on_start(context)?;
            if self.fail_start {
                return Err(GraphError::operation(self.inner.name.clone(), "cannot open"));
            }
            Ok(())
        }

        fn on_finish(&mut self) -> GraphResult<()> {
            self.inner.on_finish()?;
            if self.fail_finish {
                return Err(GraphError::operation(self.inner.name.clone(), "cannot flush"));
            }
            Ok(())
        }
    }

    fn count_of(events: &Events, event: &str) -> usize {
        events_of(events).iter().filter(|e| e.as_str() == event).count()
    }

    fn failing_chain(
        events: &Events,
        fail_start: bool,
        fail_finish: bool,
    ) -> (OperationGraph<i32>, [OperationId; 3]) {
        let mut graph = OperationGraph::new();
        let a = graph.add_operation(Recorder::new("a", events));
        let b = graph.add_operation(FailingHook {
            inner: Recorder::new("b", events),
            fail_start,
            fail_finish,
        });
        let c = graph.add_operation(Recorder::new("c", events));
        graph.attach_consumer(a, &OutputTag::main(), b).unwrap();
        graph.attach_consumer(b, &OutputTag::main(), c).unwrap();
        (graph, [a, b, c])
    }

    #[test]
    fn test_start_failure_stops_propagation_without_rollback() {
        let events = Events::default();
        let (mut graph, [a, b, c]) = failing_chain(&events, true, false);

        let err = graph.start(a, context()).unwrap_err();

        match err {
            GraphError::OperationFailed { operation, message } => {
                assert_eq!(operation, "b");
                assert_eq!(message, "cannot open");
            }
            other => panic!("expected operation failure, got {other:?}"),
        }
        assert!(graph.is_started(a).unwrap());
        assert!(graph.is_started(b).unwrap());
        assert!(!graph.is_started(c).unwrap());
        assert_eq!(events_of(&events), vec!["start:a", "start:b"]);

        // Retrying does not revisit the operations already flagged.
        graph.start(a, context()).unwrap();
        assert!(!graph.is_started(c).unwrap());
    }

    #[test]
    fn test_start_failure_still_seals_strict_graph() {
        let events = Events::default();
        let mut graph = OperationGraph::new();
        let a = graph.add_operation(FailingHook {
            inner: Recorder::new("a", &events),
            fail_start: true,
            fail_finish: false,
        });
        let b = graph.add_operation(Recorder::new("b", &events));

        assert!(graph.start(a, context()).is_err());
        assert!(graph.is_started(a).unwrap());

        let late_wiring = graph.attach_consumer(a, &OutputTag::main(), b);
        assert!(matches!(late_wiring, Err(GraphError::WiringAfterStart(_))));
        assert!(graph.output_receivers(a).unwrap()[0].is_empty());
    }

    #[test]
    fn test_finish_failure_stops_propagation_without_rollback() {
        let events = Events::default();
        let (mut graph, [a, b, c]) = failing_chain(&events, false, true);
        graph.start(a, context()).unwrap();
        events.lock().unwrap().clear();

        let err = graph.finish(a).unwrap_err();

        assert!(matches!(
            err,
            GraphError::OperationFailed { ref operation, ref message }
                if operation == "b" && message == "cannot flush"
        ));
        assert!(graph.is_finished(a).unwrap());
        assert!(graph.is_finished(b).unwrap());
        assert!(!graph.is_finished(c).unwrap());
        assert_eq!(graph.state(c).unwrap(), LifecycleState::Started);
        assert_eq!(events_of(&events), vec!["finish:a", "finish:b"]);
    }

    #[test]
    fn test_entry_points_producers_and_topological_order() {
        let events = Events::default();
        let mut graph = OperationGraph::new();
        let a = graph.add_operation(Recorder::new("a", &events));
        let b = graph.add_operation(Recorder::new("b", &events));
        let c = graph.add_operation(Recorder::new("c", &events));
        let d = graph.add_operation(Recorder::new("d", &events));
        graph.attach_consumer(a, &OutputTag::main(), c).unwrap();
        graph.attach_consumer(b, &OutputTag::main(), c).unwrap();
        graph.attach_consumer(c, &OutputTag::main(), d).unwrap();

        assert_eq!(graph.entry_points(), vec![a, b]);
        assert_eq!(graph.producers(c).unwrap(), vec![a, b]);
        assert_eq!(graph.validate_acyclic().unwrap(), vec![a, b, c, d]);
        assert_eq!(graph.operation_count(), 4);
        assert_eq!(graph.name(d).unwrap(), "d");
    }
}
