use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::checkpoint::Cursor;

/// Repository node identifier.
///
/// A negative id is the container alias of the node with the positive id:
/// both name the same object, and ancestry rows for volumes are keyed by the
/// negated form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub i64);

impl NodeId {
    /// The other identity of the same object.
    pub fn alias(self) -> NodeId {
        NodeId(-self.0)
    }

    pub fn is_container_alias(self) -> bool {
        self.0 < 0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One candidate row, decoded once at the repository boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRow {
    pub id: NodeId,
    pub parent_id: NodeId,
    pub subtype: i64,
    pub modify_date: NaiveDateTime,
    pub create_date: Option<NaiveDateTime>,
    pub name: Option<String>,
}

impl NodeRow {
    /// The cursor position this row occupies in delivery order.
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.modify_date, self.id.0)
    }
}
