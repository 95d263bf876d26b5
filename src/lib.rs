//! Single-node execution core for batch pipelines.
//!
//! Stages ("operations") are wired into a directed acyclic graph and driven
//! through a start/process/finish lifecycle; see [`graph`] for the model and
//! [`graph::TaskRunner`] for the driver.

pub mod config;
pub mod error;
pub mod graph;
pub mod logging;

pub use config::{GraphConfig, LifecyclePolicy};
pub use error::{GraphError, GraphResult};
