//! Lode DB - SQLite node repository and redb checkpoint storage.

pub mod checkpoint_store;
#[cfg(any(test, feature = "test-utils"))]
pub mod fixture;
pub mod repository;
pub mod tables;

pub use checkpoint_store::RedbCheckpointStore;
pub use repository::SqliteRepository;

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use redb::Database;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use lode_core::StorageError;

/// Connect to the repository database.
///
/// In-memory databases are private to a connection, so they get a pool of one.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(5))
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

    let max_connections = if database_url.contains(":memory:") {
        1
    } else {
        10
    };

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

/// Create the Livelink tables the traversal reads, for local and test databases.
pub async fn create_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(include_str!("../migrations/001_livelink_schema.sql"))
        .execute(pool)
        .await?;
    Ok(())
}

/// Open (or create) the checkpoint database with its tables.
pub fn init_checkpoint_database(path: impl AsRef<Path>) -> Result<Arc<Database>, StorageError> {
    let db = Database::create(path).map_err(|e| StorageError::Database(e.to_string()))?;

    RedbCheckpointStore::init_tables(&db)?;

    Ok(Arc::new(db))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_create_schema_is_idempotent() {
        let pool = init_pool("sqlite::memory:").await.unwrap();
        create_schema(&pool).await.unwrap();
        create_schema(&pool).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM WebNodes")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_init_checkpoint_database() {
        let dir = tempdir().unwrap();
        let db = init_checkpoint_database(dir.path().join("test.redb")).unwrap();

        let _store = RedbCheckpointStore::new(db);
    }
}
