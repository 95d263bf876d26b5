use crate::error::{GraphError, GraphResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How strictly the graph enforces the start/process/finish call order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePolicy {
    /// Reject `process` outside `{started, !finished}` and wiring after start
    #[default]
    Strict,

    /// Trust the caller; out-of-order calls are not checked
    Permissive,
}

/// Graph execution configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Lifecycle enforcement policy
    #[serde(default)]
    pub lifecycle: LifecyclePolicy,

    /// Maximum number of operations one element may pass through synchronously,
    /// counting the operation it was fed to
    ///
    /// Inclusive: with `max_depth = 2` a chain `a -> b` processes, and the
    /// element fails with `DepthExceeded` when `b` emits to a third operation.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize {
    256
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            lifecycle: LifecyclePolicy::default(),
            max_depth: default_max_depth(),
        }
    }
}

impl GraphConfig {
    /// Start a new builder
    pub fn builder() -> GraphConfigBuilder {
        GraphConfigBuilder::new()
    }

    /// Parse and validate a JSON config document
    pub fn from_json_str(json: &str) -> GraphResult<Self> {
        let config: GraphConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config document from disk
    pub fn from_json_file(path: impl AsRef<Path>) -> GraphResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn is_strict(&self) -> bool {
        self.lifecycle == LifecyclePolicy::Strict
    }

    fn validate(&self) -> GraphResult<()> {
        if self.max_depth == 0 {
            return Err(GraphError::ConfigError(
                "max_depth must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for constructing GraphConfig instances with a fluent API
///
/// # Example
/// ```
/// use opgraph::config::{GraphConfig, LifecyclePolicy};
///
/// let config = GraphConfig::builder()
///     .lifecycle(LifecyclePolicy::Permissive)
///     .max_depth(64)
///     .build()
///     .unwrap();
/// assert!(!config.is_strict());
/// ```
#[derive(Debug, Default)]
pub struct GraphConfigBuilder {
    lifecycle: Option<LifecyclePolicy>,
    max_depth: Option<usize>,
}

impl GraphConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the lifecycle enforcement policy
    pub fn lifecycle(mut self, lifecycle: LifecyclePolicy) -> Self {
        self.lifecycle = Some(lifecycle);
        self
    }

    /// Set the maximum synchronous emit depth
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Build the GraphConfig instance
    ///
    /// # Errors
    /// Returns `GraphError::BuilderError` if `max_depth` is zero
    pub fn build(self) -> GraphResult<GraphConfig> {
        let config = GraphConfig {
            lifecycle: self.lifecycle.unwrap_or_default(),
            max_depth: self.max_depth.unwrap_or_else(default_max_depth),
        };
        config
            .validate()
            .map_err(|e| GraphError::BuilderError(e.to_string()))?;
        Ok(config)
    }
}
