use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use lode_core::{CheckpointStore, NodeRepository, NodeRow, TraversalError};

use crate::manager::TraversalManager;

/// Error reported by a sink that could not take a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkError(pub String);

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sink error: {}", self.0)
    }
}

impl std::error::Error for SinkError {}

/// Receiver of delivered nodes, typically the feed to the search index.
///
/// Delivery is at-least-once, so implementations must be idempotent on
/// node id.
pub trait BatchSink: Send + Sync {
    fn deliver(&self, nodes: &[NodeRow]) -> impl Future<Output = Result<(), SinkError>> + Send;
}

/// What one harvest step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestOutcome {
    CaughtUp,
    Delivered { nodes: usize, full: bool },
    Rejected,
}

/// Statistics from the harvest steps run so far.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HarvestStats {
    pub batches_delivered: usize,
    pub nodes_delivered: usize,
    pub batches_rejected: usize,
    pub transient_errors: usize,
}

/// Feeds batches from a traversal into a sink and persists progress.
pub struct Harvester<R, C, S>
where
    R: NodeRepository,
    C: CheckpointStore,
    S: BatchSink,
{
    connector: String,
    manager: TraversalManager<R>,
    checkpoint_store: Arc<C>,
    sink: Arc<S>,
    stats: HarvestStats,
}

impl<R, C, S> Harvester<R, C, S>
where
    R: NodeRepository,
    C: CheckpointStore,
    S: BatchSink,
{
    pub fn new(
        connector: impl Into<String>,
        manager: TraversalManager<R>,
        checkpoint_store: Arc<C>,
        sink: Arc<S>,
    ) -> Self {
        Self {
            connector: connector.into(),
            manager,
            checkpoint_store,
            sink,
            stats: HarvestStats::default(),
        }
    }

    pub fn manager(&self) -> &TraversalManager<R> {
        &self.manager
    }

    pub fn stats(&self) -> HarvestStats {
        self.stats
    }

    /// Pick up where the last run stopped, if it persisted a checkpoint.
    pub fn resume(&mut self) -> Result<(), TraversalError> {
        if let Some(encoded) = self.checkpoint_store.load(&self.connector)? {
            self.manager.restore(&encoded)?;
            tracing::info!(
                "Resuming {} from {}",
                self.connector,
                self.manager.checkpoint()
            );
        }
        Ok(())
    }

    /// Fetch one batch, deliver it, and commit it if the sink took it.
    pub async fn harvest_once(&mut self) -> Result<HarvestOutcome, TraversalError> {
        let Some(batch) = self.manager.advance().await? else {
            return Ok(HarvestOutcome::CaughtUp);
        };

        match self.sink.deliver(batch.nodes()).await {
            Ok(()) => {
                let nodes = batch.len();
                let checkpoint = self.manager.accept(batch)?;
                self.checkpoint_store
                    .save(&self.connector, &checkpoint.encode())?;

                self.stats.batches_delivered += 1;
                self.stats.nodes_delivered += nodes;
                Ok(HarvestOutcome::Delivered {
                    nodes,
                    full: nodes >= self.manager.page_size(),
                })
            }
            Err(e) => {
                tracing::warn!("{} refused a batch: {}", self.connector, e);
                self.manager.reject(batch);
                self.stats.batches_rejected += 1;
                Ok(HarvestOutcome::Rejected)
            }
        }
    }

    /// Harvest until a fatal error.
    ///
    /// Full batches are followed immediately by the next fetch; otherwise
    /// the loop waits `interval` before polling again.
    pub async fn run(&mut self, interval: Duration) -> Result<(), TraversalError> {
        loop {
            match self.harvest_once().await {
                Ok(HarvestOutcome::Delivered { full: true, .. }) => continue,
                Ok(HarvestOutcome::Delivered { nodes, .. }) => {
                    tracing::info!(
                        "{} caught up after {} nodes ({} total)",
                        self.connector,
                        nodes,
                        self.stats.nodes_delivered
                    );
                }
                Ok(HarvestOutcome::CaughtUp) | Ok(HarvestOutcome::Rejected) => {}
                Err(e) if e.is_transient() => {
                    self.stats.transient_errors += 1;
                    tracing::warn!("{} will retry: {}", self.connector, e);
                }
                Err(e) => {
                    tracing::error!("{} stopped: {}", self.connector, e);
                    return Err(e);
                }
            }

            sleep(interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{day, node, MockRepository};
    use lode_core::{Checkpoint, FilterConfig, InMemoryCheckpointStore, RepositoryError};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        delivered: Mutex<Vec<i64>>,
        refusals: Mutex<usize>,
    }

    impl RecordingSink {
        fn refuse_next(&self) {
            *self.refusals.lock().unwrap() += 1;
        }

        fn delivered(&self) -> Vec<i64> {
            self.delivered.lock().unwrap().clone()
        }
    }

    impl BatchSink for RecordingSink {
        async fn deliver(&self, nodes: &[NodeRow]) -> Result<(), SinkError> {
            let mut refusals = self.refusals.lock().unwrap();
            if *refusals > 0 {
                *refusals -= 1;
                return Err(SinkError("index busy".to_string()));
            }
            self.delivered
                .lock()
                .unwrap()
                .extend(nodes.iter().map(|n| n.id.0));
            Ok(())
        }
    }

    type TestHarvester = Harvester<MockRepository, InMemoryCheckpointStore, RecordingSink>;

    fn harvester(
        repository: Arc<MockRepository>,
        store: Arc<InMemoryCheckpointStore>,
        sink: Arc<RecordingSink>,
    ) -> TestHarvester {
        let manager = TraversalManager::new(repository, &FilterConfig::new(), Checkpoint::None, 2);
        Harvester::new("livelink", manager, store, sink)
    }

    fn five_nodes() -> Arc<MockRepository> {
        Arc::new(MockRepository::with_rows(
            (1..=5).map(|i| node(i, day(i as u32))).collect(),
        ))
    }

    #[tokio::test]
    async fn test_harvest_persists_checkpoint() {
        let store = Arc::new(InMemoryCheckpointStore::new());
        let sink = Arc::new(RecordingSink::default());
        let mut harvester = harvester(five_nodes(), store.clone(), sink.clone());

        assert_eq!(
            harvester.harvest_once().await.unwrap(),
            HarvestOutcome::Delivered {
                nodes: 2,
                full: true
            }
        );
        assert_eq!(
            store.load("livelink").unwrap().as_deref(),
            Some("2007-01-02 00:00:00,2")
        );

        harvester.harvest_once().await.unwrap();
        assert_eq!(
            harvester.harvest_once().await.unwrap(),
            HarvestOutcome::Delivered {
                nodes: 1,
                full: false
            }
        );
        assert_eq!(
            harvester.harvest_once().await.unwrap(),
            HarvestOutcome::CaughtUp
        );

        assert_eq!(sink.delivered(), vec![1, 2, 3, 4, 5]);
        assert_eq!(harvester.stats().batches_delivered, 3);
        assert_eq!(harvester.stats().nodes_delivered, 5);
    }

    #[tokio::test]
    async fn test_refused_batch_is_redelivered() {
        let store = Arc::new(InMemoryCheckpointStore::new());
        let sink = Arc::new(RecordingSink::default());
        let mut harvester = harvester(five_nodes(), store.clone(), sink.clone());

        sink.refuse_next();
        assert_eq!(
            harvester.harvest_once().await.unwrap(),
            HarvestOutcome::Rejected
        );
        assert_eq!(store.load("livelink").unwrap(), None);

        harvester.harvest_once().await.unwrap();
        assert_eq!(sink.delivered(), vec![1, 2]);
        assert_eq!(harvester.stats().batches_rejected, 1);
    }

    #[tokio::test]
    async fn test_resume_after_restart() {
        let repository = five_nodes();
        let store = Arc::new(InMemoryCheckpointStore::new());

        let first_sink = Arc::new(RecordingSink::default());
        let mut first = harvester(repository.clone(), store.clone(), first_sink.clone());
        first.resume().unwrap();
        first.harvest_once().await.unwrap();
        drop(first);

        let second_sink = Arc::new(RecordingSink::default());
        let mut second = harvester(repository, store, second_sink.clone());
        second.resume().unwrap();
        while let HarvestOutcome::Delivered { .. } = second.harvest_once().await.unwrap() {}

        assert_eq!(first_sink.delivered(), vec![1, 2]);
        assert_eq!(second_sink.delivered(), vec![3, 4, 5]);
    }

    #[tokio::test]
    async fn test_resume_with_corrupt_checkpoint_fails() {
        let store = Arc::new(InMemoryCheckpointStore::new());
        store.save("livelink", "garbage").unwrap();
        let mut harvester = harvester(five_nodes(), store, Arc::new(RecordingSink::default()));

        assert!(matches!(
            harvester.resume(),
            Err(TraversalError::Checkpoint(_))
        ));
        assert!(matches!(
            harvester.harvest_once().await,
            Err(TraversalError::Failed)
        ));
    }

    #[tokio::test]
    async fn test_run_stops_on_protocol_error() {
        let repository = five_nodes();
        let store = Arc::new(InMemoryCheckpointStore::new());
        let sink = Arc::new(RecordingSink::default());
        let mut harvester = harvester(repository.clone(), store, sink.clone());

        repository.fail_next(RepositoryError::Unavailable("busy".to_string()));
        repository.fail_next(RepositoryError::Protocol("no such table".to_string()));

        let err = harvester.run(Duration::from_millis(1)).await.unwrap_err();

        assert!(matches!(
            err,
            TraversalError::Repository(RepositoryError::Protocol(_))
        ));
        assert_eq!(harvester.stats().transient_errors, 1);
        assert!(sink.delivered().is_empty());
    }
}
