//! Relational filter conditions over the node view and its ancestor table.
//!
//! Conditions are built as a small AST and turned into SQL in one place,
//! [`Predicate::render`], parameterised by a [`Dialect`]. Integer sets are
//! inlined (they only ever come from validated configuration); cursor values
//! are emitted as `?` placeholders with an ordered bind list.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::checkpoint::Cursor;

/// Columns of the node view the traversal filters and orders on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    DataId,
    SubType,
    ModifyDate,
}

impl Column {
    pub fn name(self) -> &'static str {
        match self {
            Column::DataId => "DataID",
            Column::SubType => "SubType",
            Column::ModifyDate => "ModifyDate",
        }
    }
}

/// How a dialect bounds the number of returned rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowLimit {
    /// `... limit N`
    Limit,
    /// `select top N ...`
    Top,
}

/// Table names and syntax of one target database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dialect {
    pub node_view: &'static str,
    pub tree_table: &'static str,
    pub ancestor_table: &'static str,
    pub row_limit: RowLimit,
}

impl Dialect {
    pub const fn livelink() -> Self {
        Self {
            node_view: "WebNodes",
            tree_table: "DTree",
            ancestor_table: "DTreeAncestors",
            row_limit: RowLimit::Limit,
        }
    }

    pub const fn sql_server() -> Self {
        Self {
            row_limit: RowLimit::Top,
            ..Self::livelink()
        }
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::livelink()
    }
}

/// Category restriction inside ancestry sub-queries.
///
/// Nothing populates it yet, so it is always rendered as the SQL literal
/// `null`, which makes the enclosing sub-query select no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restriction {
    Unpopulated,
}

/// The ancestors whose subtrees a descendant sub-query selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AncestorSet {
    /// Explicit ids, rendered verbatim.
    Ids(Vec<i64>),
    /// Every node of the given subtypes, under both of its identities.
    ContainersOfSubtype(Vec<i64>),
}

/// `select DataID from <ancestors> where [<restriction> and] AncestorID in (...)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descendants {
    pub restriction: Option<Restriction>,
    pub ancestors: AncestorSet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    In {
        column: Column,
        values: Vec<i64>,
        negated: bool,
    },
    InDescendants {
        negated: bool,
        descendants: Descendants,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    /// Strictly after a cursor in delivery order.
    After(Cursor),
    /// Exactly at a cursor.
    At(Cursor),
}

impl Predicate {
    pub fn in_list(column: Column, values: impl IntoIterator<Item = i64>) -> Self {
        Predicate::In {
            column,
            values: values.into_iter().collect(),
            negated: false,
        }
    }

    pub fn not_in_list(column: Column, values: impl IntoIterator<Item = i64>) -> Self {
        Predicate::In {
            column,
            values: values.into_iter().collect(),
            negated: true,
        }
    }

    pub fn in_descendants(descendants: Descendants) -> Self {
        Predicate::InDescendants {
            negated: false,
            descendants,
        }
    }

    pub fn not_in_descendants(descendants: Descendants) -> Self {
        Predicate::InDescendants {
            negated: true,
            descendants,
        }
    }

    pub fn render(&self, dialect: &Dialect) -> Rendered {
        let mut out = Rendered::default();
        self.write(dialect, &mut out, false);
        out
    }

    fn write(&self, dialect: &Dialect, out: &mut Rendered, inside_or: bool) {
        match self {
            Predicate::In {
                column,
                values,
                negated,
            } => {
                if values.is_empty() {
                    // Nothing is in the empty set.
                    out.sql.push_str(if *negated { "1 = 1" } else { "1 = 0" });
                    return;
                }
                out.sql.push_str(column.name());
                out.sql.push_str(if *negated { " not in (" } else { " in (" });
                push_list(&mut out.sql, values);
                out.sql.push(')');
            }
            Predicate::InDescendants {
                negated,
                descendants,
            } => {
                out.sql.push_str(Column::DataId.name());
                out.sql.push_str(if *negated { " not in (" } else { " in (" });
                descendants.write(dialect, &mut out.sql);
                out.sql.push(')');
            }
            Predicate::And(operands) => {
                if inside_or {
                    out.sql.push('(');
                }
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        out.sql.push_str(" and ");
                    }
                    operand.write(dialect, out, false);
                }
                if inside_or {
                    out.sql.push(')');
                }
            }
            Predicate::Or(operands) => {
                out.sql.push('(');
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        out.sql.push_str(" or ");
                    }
                    operand.write(dialect, out, true);
                }
                out.sql.push(')');
            }
            Predicate::After(cursor) => {
                out.sql
                    .push_str("(ModifyDate > ? or (ModifyDate = ? and DataID > ?))");
                out.binds.push(Bind::Timestamp(cursor.modified));
                out.binds.push(Bind::Timestamp(cursor.modified));
                out.binds.push(Bind::Integer(cursor.id));
            }
            Predicate::At(cursor) => {
                out.sql.push_str("(ModifyDate = ? and DataID = ?)");
                out.binds.push(Bind::Timestamp(cursor.modified));
                out.binds.push(Bind::Integer(cursor.id));
            }
        }
    }
}

impl Descendants {
    fn write(&self, dialect: &Dialect, sql: &mut String) {
        sql.push_str("select DataID from ");
        sql.push_str(dialect.ancestor_table);
        sql.push_str(" where ");
        if let Some(Restriction::Unpopulated) = self.restriction {
            sql.push_str("null and ");
        }
        sql.push_str("AncestorID in (");
        match &self.ancestors {
            AncestorSet::Ids(ids) => push_list(sql, ids),
            AncestorSet::ContainersOfSubtype(subtypes) => {
                for (i, select) in ["select DataID", "select -DataID"].iter().enumerate() {
                    if i > 0 {
                        sql.push_str(" union ");
                    }
                    sql.push_str(select);
                    sql.push_str(" from ");
                    sql.push_str(dialect.tree_table);
                    sql.push_str(" where SubType in (");
                    push_list(sql, subtypes);
                    sql.push(')');
                }
            }
        }
        sql.push(')');
    }
}

fn push_list(sql: &mut String, values: &[i64]) {
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            sql.push(',');
        }
        sql.push_str(&value.to_string());
    }
}

/// A value bound to a `?` placeholder, in placeholder order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bind {
    Timestamp(NaiveDateTime),
    Integer(i64),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rendered {
    pub sql: String,
    pub binds: Vec<Bind>,
}

/// A condition, or `absent` for "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment(Option<Predicate>);

impl Fragment {
    pub fn absent() -> Self {
        Fragment(None)
    }

    pub fn of(predicate: Predicate) -> Self {
        Fragment(Some(predicate))
    }

    pub fn is_absent(&self) -> bool {
        self.0.is_none()
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        self.0.as_ref()
    }

    /// Conjunction; `absent` is the identity.
    pub fn and(self, other: Fragment) -> Fragment {
        match (self.0, other.0) {
            (None, rhs) => Fragment(rhs),
            (lhs, None) => Fragment(lhs),
            (Some(lhs), Some(rhs)) => {
                let mut operands = Vec::new();
                for operand in [lhs, rhs] {
                    match operand {
                        Predicate::And(inner) => operands.extend(inner),
                        other => operands.push(other),
                    }
                }
                Fragment(Some(Predicate::And(operands)))
            }
        }
    }

    /// Disjunction; `absent` is the identity.
    pub fn or(self, other: Fragment) -> Fragment {
        match (self.0, other.0) {
            (None, rhs) => Fragment(rhs),
            (lhs, None) => Fragment(lhs),
            (Some(lhs), Some(rhs)) => {
                let mut operands = Vec::new();
                for operand in [lhs, rhs] {
                    match operand {
                        Predicate::Or(inner) => operands.extend(inner),
                        other => operands.push(other),
                    }
                }
                Fragment(Some(Predicate::Or(operands)))
            }
        }
    }

    pub fn render(&self, dialect: &Dialect) -> Option<Rendered> {
        self.0.as_ref().map(|p| p.render(dialect))
    }

    /// SQL text alone, for fragments that carry no bound values.
    pub fn to_sql(&self, dialect: &Dialect) -> Option<String> {
        self.render(dialect).map(|r| r.sql)
    }
}

impl From<Predicate> for Fragment {
    fn from(predicate: Predicate) -> Self {
        Fragment::of(predicate)
    }
}
