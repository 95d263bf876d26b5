use crate::error::GraphResult;
use crate::graph::{Emitter, ExecutionContext, Operation, OutputTag, WindowedValue};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Context counter incremented by every [`CountingSink`]
pub const ELEMENTS_COUNTED: &str = "elements_counted";

/// Shared view of the elements gathered by a [`CollectSink`]
#[derive(Debug)]
pub struct CollectHandle<T> {
    elements: Arc<Mutex<Vec<WindowedValue<T>>>>,
}

impl<T> Clone for CollectHandle<T> {
    fn clone(&self) -> Self {
        Self {
            elements: Arc::clone(&self.elements),
        }
    }
}

impl<T: Clone> CollectHandle<T> {
    /// Collected elements in arrival order
    pub fn elements(&self) -> Vec<WindowedValue<T>> {
        match self.elements.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Collected values in arrival order
    pub fn values(&self) -> Vec<T> {
        self.elements()
            .into_iter()
            .map(WindowedValue::into_value)
            .collect()
    }

    pub fn len(&self) -> usize {
        match self.elements.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Terminal operation that stores every element it receives
pub struct CollectSink<T> {
    name: String,
    elements: Arc<Mutex<Vec<WindowedValue<T>>>>,
}

impl<T> CollectSink<T> {
    /// Create the sink together with the handle used to read its contents
    pub fn new(name: impl Into<String>) -> (Self, CollectHandle<T>) {
        let elements = Arc::new(Mutex::new(Vec::new()));
        let handle = CollectHandle {
            elements: Arc::clone(&elements),
        };
        (
            Self {
                name: name.into(),
                elements,
            },
            handle,
        )
    }
}

impl<T: Clone + Send> Operation<T> for CollectSink<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_outputs(&self) -> usize {
        0
    }

    fn output_index(&self, _tag: &OutputTag) -> Option<usize> {
        None
    }

    fn process(&mut self, elem: WindowedValue<T>, _out: &mut Emitter<'_, T>) -> GraphResult<()> {
        self.elements.lock()?.push(elem);
        Ok(())
    }
}

/// Shared counters of a [`CountingSink`]
#[derive(Debug, Clone, Default)]
pub struct CountHandle {
    count: Arc<AtomicU64>,
    starts: Arc<AtomicUsize>,
    finishes: Arc<AtomicUsize>,
}

impl CountHandle {
    /// Elements processed
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Times `on_start` ran
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::Relaxed)
    }

    /// Times `on_finish` ran
    pub fn finishes(&self) -> usize {
        self.finishes.load(Ordering::Relaxed)
    }
}

/// Terminal operation that counts elements
///
/// Each element also bumps the [`ELEMENTS_COUNTED`] counter of the execution
/// context, so counts from several sinks of one task aggregate there.
pub struct CountingSink<T> {
    name: String,
    handle: CountHandle,
    _marker: PhantomData<fn(T)>,
}

impl<T> CountingSink<T> {
    /// Create the sink together with its counters
    pub fn new(name: impl Into<String>) -> (Self, CountHandle) {
        let handle = CountHandle::default();
        (
            Self {
                name: name.into(),
                handle: handle.clone(),
                _marker: PhantomData,
            },
            handle,
        )
    }
}

impl<T> Operation<T> for CountingSink<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_outputs(&self) -> usize {
        0
    }

    fn output_index(&self, _tag: &OutputTag) -> Option<usize> {
        None
    }

    fn process(&mut self, _elem: WindowedValue<T>, out: &mut Emitter<'_, T>) -> GraphResult<()> {
        self.handle.count.fetch_add(1, Ordering::Relaxed);
        out.context()?.inc_counter(ELEMENTS_COUNTED)?;
        Ok(())
    }

    fn on_start(&mut self, _context: &ExecutionContext) -> GraphResult<()> {
        self.handle.starts.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn on_finish(&mut self) -> GraphResult<()> {
        self.handle.finishes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
