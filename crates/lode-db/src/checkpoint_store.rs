use std::sync::Arc;

use redb::Database;

use lode_core::{CheckpointStore, StorageError};

use crate::tables::CHECKPOINTS_TABLE;

/// redb implementation of CheckpointStore.
pub struct RedbCheckpointStore {
    db: Arc<Database>,
}

impl RedbCheckpointStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Initialize the database tables.
    pub fn init_tables(db: &Database) -> Result<(), StorageError> {
        let write_txn = db
            .begin_write()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        {
            let _ = write_txn
                .open_table(CHECKPOINTS_TABLE)
                .map_err(|e| StorageError::Database(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(())
    }
}

impl CheckpointStore for RedbCheckpointStore {
    fn load(&self, connector: &str) -> Result<Option<String>, StorageError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let table = read_txn
            .open_table(CHECKPOINTS_TABLE)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let value = table
            .get(connector)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(value.map(|v| v.value().to_string()))
    }

    fn save(&self, connector: &str, encoded: &str) -> Result<(), StorageError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        {
            let mut table = write_txn
                .open_table(CHECKPOINTS_TABLE)
                .map_err(|e| StorageError::Database(e.to_string()))?;

            table
                .insert(connector, encoded)
                .map_err(|e| StorageError::Database(e.to_string()))?;
        }

        write_txn
            .commit()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(())
    }
}
