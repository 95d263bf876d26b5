use thiserror::Error;

/// Central error type for operation graph construction and execution
#[derive(Error, Debug)]
pub enum GraphError {
    // ============================================================================
    // Processing Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Processing interrupted: {0}")]
    Interrupted(String),

    #[error("Operation '{operation}' failed: {message}")]
    OperationFailed { operation: String, message: String },

    // ============================================================================
    // Wiring Errors
    // ============================================================================
    #[error("Unknown operation id: {0}")]
    UnknownOperation(usize),

    #[error("Operation '{operation}' has no output slot for tag '{tag}'")]
    InvalidOutputTag { operation: String, tag: String },

    #[error("Cannot attach consumers after execution started: {0}")]
    WiringAfterStart(String),

    #[error("Operation graph contains a cycle through operations {0:?}")]
    CycleDetected(Vec<usize>),

    // ============================================================================
    // Lifecycle Errors
    // ============================================================================
    #[error("Operation '{0}' received an element before it was started")]
    NotStarted(String),

    #[error("Operation '{0}' received an element after it was finished")]
    AlreadyFinished(String),

    #[error("Operation '{0}' was re-entered while processing an element")]
    ReentrantProcess(String),

    #[error("Operation '{operation}' is deeper than the limit of {max_depth} nested operations")]
    DepthExceeded { operation: String, max_depth: usize },

    // ============================================================================
    // Context / Configuration Errors
    // ============================================================================
    #[error("Execution context error: {0}")]
    ContextError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Mutex lock error")]
    LockError,

    /// Builder pattern validation error
    #[error("Builder error: {0}")]
    BuilderError(String),
}

// Implement conversion from PoisonError for Mutex locks
impl<T> From<std::sync::PoisonError<T>> for GraphError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        GraphError::LockError
    }
}

impl From<GraphError> for String {
    fn from(error: GraphError) -> Self {
        error.to_string()
    }
}

impl From<String> for GraphError {
    fn from(err: String) -> Self {
        GraphError::OperationFailed {
            operation: "unknown".to_string(),
            message: err,
        }
    }
}

impl From<&str> for GraphError {
    fn from(err: &str) -> Self {
        GraphError::from(err.to_string())
    }
}

impl GraphError {
    /// Failure raised by a named operation
    pub fn operation(operation: impl Into<String>, message: impl Into<String>) -> Self {
        GraphError::OperationFailed {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Whether this error is a cooperative cancellation rather than a fault
    pub fn is_interruption(&self) -> bool {
        matches!(self, GraphError::Interrupted(_))
    }
}

// Helper type alias for Results
pub type GraphResult<T> = Result<T, GraphError>;
