//! Lode Core - Node model, filter compilation, checkpoints and store traits.
//!
//! This crate holds the pure part of the traversal: it renders filter
//! configuration into SQL fragments and defines the cursor that orders
//! delivery. It performs no I/O.

pub mod checkpoint;
pub mod error;
pub mod filter;
pub mod node;
pub mod predicate;
pub mod query;
pub mod storage;
pub mod validation;

// Re-exports for convenience
pub use checkpoint::{Checkpoint, Cursor};
pub use error::{
    CheckpointFormatError, ConfigurationError, RepositoryError, StorageError, TraversalError,
};
pub use filter::{CompiledFilters, FilterCompiler, FilterConfig, FilterSettings};
pub use node::{NodeId, NodeRow};
pub use predicate::{Bind, Dialect, Fragment, Predicate, Rendered};
pub use query::NodeQuery;
pub use storage::{CheckpointStore, NodeRepository};
pub use validation::Validator;

#[cfg(any(test, feature = "test-utils"))]
pub use storage::memory::InMemoryCheckpointStore;
