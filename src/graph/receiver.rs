use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable index of an operation inside an [`OperationGraph`](super::OperationGraph)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperationId(pub(crate) usize);

impl OperationId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Caller-defined discriminator naming one output of an operation
///
/// Producers resolve a tag to a slot index through
/// [`Operation::output_index`](super::Operation::output_index).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputTag(String);

impl OutputTag {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Tag conventionally used for the single output of an operation
    pub fn main() -> Self {
        Self::new("main")
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OutputTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OutputTag {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Fan-out point for one output slot of an operation
///
/// Holds the downstream operations registered on the slot in registration
/// order. Every element emitted on the slot is delivered to each of them in
/// that order. Duplicate registrations are kept and receive duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputReceiver {
    consumers: Vec<OperationId>,
}

impl OutputReceiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a downstream operation
    pub fn add_output(&mut self, operation: OperationId) {
        self.consumers.push(operation);
    }

    /// Registered consumers in registration order
    pub fn receiving_operations(&self) -> &[OperationId] {
        &self.consumers
    }

    pub fn len(&self) -> usize {
        self.consumers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }
}
