//! Scripted repository for exercising the traversal without a database.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{NaiveDate, NaiveDateTime};

use lode_core::{
    Cursor, NodeId, NodeQuery, NodeRepository, NodeRow, Predicate, RepositoryError,
};

/// Holds rows in memory and honours only the cursor bounds of a query;
/// filter clauses are SQL and are exercised against SQLite elsewhere.
#[derive(Default)]
pub struct MockRepository {
    rows: Mutex<Vec<NodeRow>>,
    failures: Mutex<VecDeque<RepositoryError>>,
    queries: Mutex<Vec<NodeQuery>>,
}

impl MockRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<NodeRow>) -> Self {
        let repository = Self::new();
        *repository.rows.lock().unwrap() = rows;
        repository
    }

    pub fn push_row(&self, row: NodeRow) {
        self.rows.lock().unwrap().push(row);
    }

    /// Make the next call fail with `error`.
    pub fn fail_next(&self, error: RepositoryError) {
        self.failures.lock().unwrap().push_back(error);
    }

    pub fn queries(&self) -> Vec<NodeQuery> {
        self.queries.lock().unwrap().clone()
    }
}

fn bounds(predicate: &Predicate, after: &mut Option<Cursor>, at: &mut Option<Cursor>) {
    match predicate {
        Predicate::After(cursor) => *after = Some(*cursor),
        Predicate::At(cursor) => *at = Some(*cursor),
        Predicate::And(operands) => {
            for operand in operands {
                bounds(operand, after, at);
            }
        }
        _ => {}
    }
}

impl NodeRepository for MockRepository {
    async fn list_nodes(&self, query: &NodeQuery) -> Result<Vec<NodeRow>, RepositoryError> {
        self.queries.lock().unwrap().push(query.clone());
        if let Some(error) = self.failures.lock().unwrap().pop_front() {
            return Err(error);
        }

        let (mut after, mut at) = (None, None);
        if let Some(predicate) = query.filter.predicate() {
            bounds(predicate, &mut after, &mut at);
        }

        let mut rows: Vec<NodeRow> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| after.map_or(true, |cursor| row.cursor() > cursor))
            .filter(|row| at.map_or(true, |cursor| row.cursor() == cursor))
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.cursor());
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }
}

pub fn day(n: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2007, 1, n)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn node(id: i64, modified: NaiveDateTime) -> NodeRow {
    NodeRow {
        id: NodeId(id),
        parent_id: NodeId(-2000),
        subtype: 144,
        modify_date: modified,
        create_date: Some(modified),
        name: Some(format!("node-{}", id)),
    }
}

pub fn ids<'a>(rows: impl IntoIterator<Item = &'a NodeRow>) -> Vec<i64> {
    rows.into_iter().map(|row| row.id.0).collect()
}
