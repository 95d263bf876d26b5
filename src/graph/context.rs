use crate::error::{GraphError, GraphResult};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Mutex;

/// Per-task environment injected into every operation when it starts
///
/// The context carries configuration settings, named side inputs, free-form
/// metadata and monotonic metric counters. It is populated by the driver
/// before execution and then shared read-only (counters aside) through an
/// `Arc`.
///
/// # Example
/// ```
/// use opgraph::graph::ExecutionContext;
///
/// let mut context = ExecutionContext::new("task-7");
/// context.set_string("output_prefix", "part-");
/// context.set_side_input("lookup", vec![1.into(), 2.into()]);
///
/// assert_eq!(context.get_string("output_prefix").unwrap(), "part-");
/// assert_eq!(context.side_input("lookup").unwrap().len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct ExecutionContext {
    /// Identifier of the task this graph instance belongs to
    task_id: String,

    /// Configuration settings
    settings: HashMap<String, Value>,

    /// Read-only side inputs, keyed by name
    side_inputs: HashMap<String, Vec<Value>>,

    /// Metadata about the task execution
    metadata: HashMap<String, String>,

    /// Metric counters
    counters: Mutex<BTreeMap<String, u64>>,
}

#[derive(Debug, Deserialize)]
struct ContextDocument {
    task_id: String,
    #[serde(default)]
    settings: HashMap<String, Value>,
    #[serde(default)]
    side_inputs: HashMap<String, Vec<Value>>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

impl ExecutionContext {
    /// Create a new, empty context
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            ..Self::default()
        }
    }

    /// Build a context from a JSON document
    ///
    /// Expected shape: `{"task_id": "...", "settings": {..}, "side_inputs": {..}, "metadata": {..}}`.
    /// Everything except `task_id` is optional.
    pub fn from_json_str(json: &str) -> GraphResult<Self> {
        let doc: ContextDocument = serde_json::from_str(json)?;
        if doc.task_id.trim().is_empty() {
            return Err(GraphError::ContextError(
                "task_id must not be empty".to_string(),
            ));
        }
        Ok(Self {
            task_id: doc.task_id,
            settings: doc.settings,
            side_inputs: doc.side_inputs,
            metadata: doc.metadata,
            counters: Mutex::new(BTreeMap::new()),
        })
    }

    /// Build a context from a JSON file on disk
    pub fn from_json_file(path: impl AsRef<Path>) -> GraphResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Get the task ID
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Set a setting
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.settings.insert(key.into(), value);
    }

    /// Get a setting
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.settings.get(key)
    }

    /// Get a setting or return an error if not found
    pub fn get_required(&self, key: &str) -> GraphResult<&Value> {
        self.settings.get(key).ok_or_else(|| {
            GraphError::ContextError(format!("Required setting not found: {}", key))
        })
    }

    /// Set a string setting
    pub fn set_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.settings.insert(key.into(), Value::String(value.into()));
    }

    /// Get a string setting
    pub fn get_string(&self, key: &str) -> GraphResult<String> {
        match self.get_required(key)? {
            Value::String(s) => Ok(s.clone()),
            _ => Err(GraphError::ContextError(format!(
                "Setting '{}' is not a string",
                key
            ))),
        }
    }

    /// Set a boolean setting
    pub fn set_bool(&mut self, key: impl Into<String>, value: bool) {
        self.settings.insert(key.into(), Value::Bool(value));
    }

    /// Get a boolean setting
    pub fn get_bool(&self, key: &str) -> GraphResult<bool> {
        match self.get_required(key)? {
            Value::Bool(b) => Ok(*b),
            _ => Err(GraphError::ContextError(format!(
                "Setting '{}' is not a boolean",
                key
            ))),
        }
    }

    /// Set a number setting
    ///
    /// Non-finite values cannot be represented in JSON and are rejected.
    pub fn set_number(&mut self, key: impl Into<String>, value: f64) -> GraphResult<()> {
        let key = key.into();
        let number = serde_json::Number::from_f64(value).ok_or_else(|| {
            GraphError::ContextError(format!("Setting '{}' is not a finite number", key))
        })?;
        self.settings.insert(key, Value::Number(number));
        Ok(())
    }

    /// Get a number setting
    pub fn get_number(&self, key: &str) -> GraphResult<f64> {
        match self.get_required(key)? {
            Value::Number(n) => n.as_f64().ok_or_else(|| {
                GraphError::ContextError(format!("Setting '{}' is not a valid number", key))
            }),
            _ => Err(GraphError::ContextError(format!(
                "Setting '{}' is not a number",
                key
            ))),
        }
    }

    /// Check if a setting exists
    pub fn has(&self, key: &str) -> bool {
        self.settings.contains_key(key)
    }

    /// Get all setting keys
    pub fn keys(&self) -> Vec<&String> {
        self.settings.keys().collect()
    }

    /// Register a named side input
    pub fn set_side_input(&mut self, name: impl Into<String>, values: Vec<Value>) {
        self.side_inputs.insert(name.into(), values);
    }

    /// Read a side input
    pub fn side_input(&self, name: &str) -> GraphResult<&[Value]> {
        self.side_inputs
            .get(name)
            .map(|v| v.as_slice())
            .ok_or_else(|| GraphError::ContextError(format!("Side input not found: {}", name)))
    }

    /// Set metadata
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Get metadata
    pub fn get_metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(|s| s.as_str())
    }

    /// Get all metadata
    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    /// Increment a counter by one
    pub fn inc_counter(&self, name: &str) -> GraphResult<u64> {
        self.add_counter(name, 1)
    }

    /// Add `delta` to a counter, returning the new value
    pub fn add_counter(&self, name: &str, delta: u64) -> GraphResult<u64> {
        let mut counters = self.counters.lock()?;
        let counter = counters.entry(name.to_string()).or_insert(0);
        *counter = counter.saturating_add(delta);
        Ok(*counter)
    }

    /// Current value of a counter; zero if never incremented
    pub fn counter(&self, name: &str) -> GraphResult<u64> {
        let counters = self.counters.lock()?;
        Ok(counters.get(name).copied().unwrap_or(0))
    }

    /// Snapshot of all counters, ordered by name
    pub fn counters(&self) -> GraphResult<BTreeMap<String, u64>> {
        Ok(self.counters.lock()?.clone())
    }
}
