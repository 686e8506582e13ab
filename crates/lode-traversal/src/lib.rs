//! Lode Traversal - Checkpointed batch cursor and the loop that drives it.

pub mod cursor;
pub mod harvester;
pub mod manager;

#[cfg(test)]
mod testing;

pub use cursor::{Batch, BatchCursor};
pub use harvester::{BatchSink, HarvestOutcome, HarvestStats, Harvester, SinkError};
pub use manager::{PendingBatch, TraversalManager, TraversalState};
