use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Invalid list for {setting}: {value:?}")]
    InvalidList { setting: &'static str, value: String },

    #[error("Invalid entry {entry:?} in {setting}: expected a non-negative integer")]
    InvalidEntry { setting: &'static str, entry: String },
}

/// A persisted checkpoint string that cannot be turned back into a cursor.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Malformed checkpoint {value:?}: {reason}")]
pub struct CheckpointFormatError {
    pub value: String,
    pub reason: &'static str,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepositoryError {
    /// Transient; retry with the same checkpoint.
    #[error("Repository unavailable: {0}")]
    Unavailable(String),

    /// The store rejected the query or the schema did not match.
    #[error("Repository protocol error: {0}")]
    Protocol(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),
}

#[derive(Error, Debug)]
pub enum TraversalError {
    #[error(transparent)]
    Checkpoint(#[from] CheckpointFormatError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Traversal has failed and needs to be reset")]
    Failed,

    #[error("Batch {0} is not the batch currently being delivered")]
    StaleBatch(u64),
}

impl TraversalError {
    /// Whether retrying from the committed checkpoint can succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TraversalError::Repository(RepositoryError::Unavailable(_))
                | TraversalError::Storage(_)
        )
    }
}
