use std::sync::Arc;

use lode_core::{
    Checkpoint, CompiledFilters, FilterCompiler, FilterConfig, NodeId, NodeRepository, NodeRow,
    RepositoryError, TraversalError,
};

use crate::cursor::{Batch, BatchCursor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalState {
    Idle,
    Fetching,
    Delivering,
    /// Needs [`TraversalManager::reset`] before it can advance again.
    Failed,
}

/// A batch handed to the caller, pending acceptance or rejection.
///
/// Iterating it yields the nodes once, in delivery order. It cannot be
/// resumed part-way: a rejected or dropped batch is fetched again from the
/// last committed checkpoint.
#[derive(Debug)]
pub struct PendingBatch {
    generation: u64,
    batch: Batch,
}

impl PendingBatch {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The checkpoint that replaces the current one on acceptance.
    pub fn checkpoint(&self) -> Checkpoint {
        self.batch.checkpoint
    }

    pub fn nodes(&self) -> &[NodeRow] {
        &self.batch.nodes
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.batch.ids()
    }

    pub fn len(&self) -> usize {
        self.batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }
}

impl<'a> IntoIterator for &'a PendingBatch {
    type Item = &'a NodeRow;
    type IntoIter = std::slice::Iter<'a, NodeRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.batch.nodes.iter()
    }
}

/// Drives the batch cursor and owns the committed checkpoint.
///
/// One fetch/deliver cycle is in flight at a time; `&mut self` on every
/// transition keeps checkpoint updates linear. The checkpoint only moves on
/// [`TraversalManager::accept`], so delivery is at-least-once.
pub struct TraversalManager<R: NodeRepository> {
    cursor: BatchCursor<R>,
    filters: CompiledFilters,
    page_size: usize,
    checkpoint: Checkpoint,
    state: TraversalState,
    generation: u64,
}

impl<R: NodeRepository> TraversalManager<R> {
    pub fn new(
        repository: Arc<R>,
        config: &FilterConfig,
        checkpoint: Checkpoint,
        page_size: usize,
    ) -> Self {
        Self {
            cursor: BatchCursor::new(repository),
            filters: FilterCompiler::compile(config),
            page_size: page_size.max(1),
            checkpoint,
            state: TraversalState::Idle,
            generation: 0,
        }
    }

    pub fn checkpoint(&self) -> Checkpoint {
        self.checkpoint
    }

    pub fn state(&self) -> TraversalState {
        self.state
    }

    pub fn filters(&self) -> &CompiledFilters {
        &self.filters
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Replace the checkpoint with a persisted one.
    ///
    /// A value that does not decode fails the traversal; guessing a cursor
    /// could skip nodes.
    pub fn restore(&mut self, encoded: &str) -> Result<(), TraversalError> {
        match Checkpoint::decode(encoded) {
            Ok(checkpoint) => {
                self.reset(checkpoint);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Cannot resume traversal: {}", e);
                self.state = TraversalState::Failed;
                Err(e.into())
            }
        }
    }

    /// Start over from `checkpoint`, leaving any failure behind. Batches
    /// handed out before the reset can no longer be accepted.
    pub fn reset(&mut self, checkpoint: Checkpoint) {
        self.checkpoint = checkpoint;
        self.state = TraversalState::Idle;
        self.generation += 1;
    }

    /// Fetch the next batch after the committed checkpoint.
    ///
    /// `Ok(None)` means there is no work right now. A batch still being
    /// delivered is abandoned, which is equivalent to rejecting it.
    pub async fn advance(&mut self) -> Result<Option<PendingBatch>, TraversalError> {
        match self.state {
            TraversalState::Failed => return Err(TraversalError::Failed),
            TraversalState::Delivering => {
                tracing::debug!("Abandoning batch {} before it was accepted", self.generation);
            }
            TraversalState::Idle | TraversalState::Fetching => {}
        }

        self.generation += 1;
        self.state = TraversalState::Fetching;

        let result = self
            .cursor
            .next_batch(&self.checkpoint, &self.filters, self.page_size)
            .await;

        match result {
            Ok(None) => {
                self.state = TraversalState::Idle;
                Ok(None)
            }
            Ok(Some(batch)) => {
                self.state = TraversalState::Delivering;
                Ok(Some(PendingBatch {
                    generation: self.generation,
                    batch,
                }))
            }
            Err(RepositoryError::Unavailable(msg)) => {
                tracing::warn!("Repository unavailable at {}: {}", self.checkpoint, msg);
                self.state = TraversalState::Idle;
                Err(RepositoryError::Unavailable(msg).into())
            }
            Err(e) => {
                tracing::error!("Traversal failed at {}: {}", self.checkpoint, e);
                self.state = TraversalState::Failed;
                Err(e.into())
            }
        }
    }

    /// Commit a fully delivered batch and return the new checkpoint.
    pub fn accept(&mut self, batch: PendingBatch) -> Result<Checkpoint, TraversalError> {
        if self.state == TraversalState::Failed {
            return Err(TraversalError::Failed);
        }
        if self.state != TraversalState::Delivering || batch.generation != self.generation {
            return Err(TraversalError::StaleBatch(batch.generation));
        }

        debug_assert!(batch.checkpoint() > self.checkpoint);
        self.checkpoint = batch.checkpoint();
        self.state = TraversalState::Idle;

        tracing::info!(
            "Committed {} nodes, checkpoint now {}",
            batch.len(),
            self.checkpoint
        );
        Ok(self.checkpoint)
    }

    /// Discard a batch; the next advance starts from the same checkpoint.
    pub fn reject(&mut self, batch: PendingBatch) {
        if self.state == TraversalState::Delivering && batch.generation == self.generation {
            tracing::warn!(
                "Rejected batch of {} nodes, retrying from {}",
                batch.len(),
                self.checkpoint
            );
            self.state = TraversalState::Idle;
        }
    }
}
