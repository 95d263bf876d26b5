//! Concrete operations
//!
//! Every operation implements [`Operation`](super::Operation):
//!
//! 1. [`PassThrough`] - re-emits each element unchanged
//! 2. [`MapOperation`] - replaces the value, keeping element metadata
//! 3. [`FilterOperation`] - emits only elements matching a predicate
//! 4. [`PartitionOperation`] - routes each element to one of several tagged outputs
//! 5. [`CollectSink`] - stores every element for later inspection
//! 6. [`CountingSink`] - counts elements and lifecycle calls

pub mod partition;
pub mod pass_through;
pub mod sink;
pub mod transform;

pub use partition::PartitionOperation;
pub use pass_through::PassThrough;
pub use sink::{CollectHandle, CollectSink, CountHandle, CountingSink};
pub use transform::{FilterOperation, MapOperation};
