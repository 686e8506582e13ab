use std::future::Future;

use crate::error::{RepositoryError, StorageError};
use crate::node::NodeRow;
use crate::query::NodeQuery;

/// Read access to the content repository's node view.
pub trait NodeRepository: Send + Sync {
    /// Run a page query and decode the rows, in the query's order.
    fn list_nodes(
        &self,
        query: &NodeQuery,
    ) -> impl Future<Output = Result<Vec<NodeRow>, RepositoryError>> + Send;
}

/// Durable storage for encoded checkpoints, one per connector.
pub trait CheckpointStore: Send + Sync {
    fn load(&self, connector: &str) -> Result<Option<String>, StorageError>;

    fn save(&self, connector: &str, encoded: &str) -> Result<(), StorageError>;
}

// In-memory implementations for testing
#[cfg(any(test, feature = "test-utils"))]
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::RwLock;

    /// In-memory checkpoint store for testing.
    #[derive(Default)]
    pub struct InMemoryCheckpointStore {
        checkpoints: RwLock<HashMap<String, String>>,
    }

    impl InMemoryCheckpointStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl CheckpointStore for InMemoryCheckpointStore {
        fn load(&self, connector: &str) -> Result<Option<String>, StorageError> {
            Ok(self.checkpoints.read().unwrap().get(connector).cloned())
        }

        fn save(&self, connector: &str, encoded: &str) -> Result<(), StorageError> {
            self.checkpoints
                .write()
                .unwrap()
                .insert(connector.to_string(), encoded.to_string());
            Ok(())
        }
    }

}
