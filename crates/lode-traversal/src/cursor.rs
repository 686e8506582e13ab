use std::sync::Arc;

use lode_core::{
    Checkpoint, CompiledFilters, Fragment, NodeId, NodeQuery, NodeRepository, NodeRow, Predicate,
    RepositoryError,
};

/// One page of candidates and the checkpoint to adopt once it is accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub nodes: Vec<NodeRow>,
    pub checkpoint: Checkpoint,
}

impl Batch {
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().map(|node| node.id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Pages through the filtered node set in checkpoint order.
pub struct BatchCursor<R: NodeRepository> {
    repository: Arc<R>,
}

impl<R: NodeRepository> BatchCursor<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Fetch the candidates strictly after `checkpoint`.
    ///
    /// Returns `None` when nothing is left, which only means the traversal
    /// has caught up. A page never ends between two rows that share a
    /// cursor: if the row after the last one would have the same cursor,
    /// every row at that cursor is pulled into this page.
    pub async fn next_batch(
        &self,
        checkpoint: &Checkpoint,
        filters: &CompiledFilters,
        page_size: usize,
    ) -> Result<Option<Batch>, RepositoryError> {
        let page_size = page_size.max(1);
        let candidates = filters.candidate_filter();

        let bound = match checkpoint {
            Checkpoint::None => Fragment::absent(),
            Checkpoint::At(cursor) => Predicate::After(*cursor).into(),
        };

        // One extra row shows whether the page boundary splits a cursor.
        let query = NodeQuery::new(candidates.clone().and(bound)).with_limit(page_size + 1);
        let mut nodes = self.repository.list_nodes(&query).await?;

        if nodes.len() > page_size {
            let lookahead = nodes.split_off(page_size);
            if let Some(boundary) = nodes.last().map(NodeRow::cursor) {
                if lookahead[0].cursor() == boundary {
                    tracing::debug!("Extending page to every row at {:?}", boundary);
                    nodes.retain(|node| node.cursor() != boundary);
                    let query = NodeQuery::new(candidates.and(Predicate::At(boundary).into()));
                    nodes.extend(self.repository.list_nodes(&query).await?);
                }
            }
        }

        let Some(last) = nodes.last() else {
            return Ok(None);
        };

        let checkpoint = Checkpoint::At(last.cursor());
        tracing::debug!("Fetched {} nodes up to {}", nodes.len(), checkpoint);

        Ok(Some(Batch { nodes, checkpoint }))
    }
}
