use chrono::NaiveDateTime;
use sqlx::SqlitePool;

use lode_core::{Bind, Dialect, NodeId, NodeQuery, NodeRepository, NodeRow, RepositoryError};

/// Node repository backed by a SQLite copy of the Livelink schema.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
    dialect: Dialect,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            dialect: Dialect::livelink(),
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }
}

/// Row shape of [`lode_core::query::NODE_COLUMNS`].
#[derive(sqlx::FromRow)]
struct NodeRecord {
    #[sqlx(rename = "DataID")]
    data_id: i64,
    #[sqlx(rename = "ParentID")]
    parent_id: i64,
    #[sqlx(rename = "SubType")]
    subtype: i64,
    #[sqlx(rename = "ModifyDate")]
    modify_date: NaiveDateTime,
    #[sqlx(rename = "CreateDate")]
    create_date: Option<NaiveDateTime>,
    #[sqlx(rename = "Name")]
    name: Option<String>,
}

impl From<NodeRecord> for NodeRow {
    fn from(record: NodeRecord) -> Self {
        NodeRow {
            id: NodeId(record.data_id),
            parent_id: NodeId(record.parent_id),
            subtype: record.subtype,
            modify_date: record.modify_date,
            create_date: record.create_date,
            name: record.name,
        }
    }
}

impl NodeRepository for SqliteRepository {
    async fn list_nodes(&self, query: &NodeQuery) -> Result<Vec<NodeRow>, RepositoryError> {
        let rendered = query.to_sql(&self.dialect);
        tracing::debug!("Listing nodes: {}", rendered.sql);

        let mut statement = sqlx::query_as::<_, NodeRecord>(&rendered.sql);
        for bind in &rendered.binds {
            statement = match *bind {
                Bind::Timestamp(timestamp) => statement.bind(timestamp),
                Bind::Integer(value) => statement.bind(value),
            };
        }

        let records = statement.fetch_all(&self.pool).await.map_err(classify)?;

        Ok(records.into_iter().map(NodeRow::from).collect())
    }
}

/// SQLite result codes for a busy or locked database.
const SQLITE_BUSY: &str = "5";
const SQLITE_LOCKED: &str = "6";

/// Split driver errors into retryable and fatal ones.
fn classify(error: sqlx::Error) -> RepositoryError {
    match &error {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => RepositoryError::Unavailable(error.to_string()),
        sqlx::Error::Database(db)
            if matches!(db.code().as_deref(), Some(SQLITE_BUSY) | Some(SQLITE_LOCKED)) =>
        {
            RepositoryError::Unavailable(error.to_string())
        }
        _ => RepositoryError::Protocol(error.to_string()),
    }
}
