use crate::predicate::{Column, Dialect, Fragment, Rendered, RowLimit};

/// Columns every candidate query selects, in decode order.
pub const NODE_COLUMNS: &str = "DataID, ParentID, SubType, ModifyDate, CreateDate, Name";

/// A page request against the node view, ordered by delivery order.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeQuery {
    pub filter: Fragment,
    pub limit: Option<usize>,
}

impl NodeQuery {
    pub fn new(filter: Fragment) -> Self {
        Self {
            filter,
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Full statement text plus the values for its placeholders.
    pub fn to_sql(&self, dialect: &Dialect) -> Rendered {
        let mut out = Rendered::default();

        out.sql.push_str("select ");
        if let (Some(limit), RowLimit::Top) = (self.limit, dialect.row_limit) {
            out.sql.push_str(&format!("top {} ", limit));
        }
        out.sql.push_str(NODE_COLUMNS);
        out.sql.push_str(" from ");
        out.sql.push_str(dialect.node_view);

        if let Some(filter) = self.filter.render(dialect) {
            out.sql.push_str(" where ");
            out.sql.push_str(&filter.sql);
            out.binds = filter.binds;
        }

        out.sql.push_str(&format!(
            " order by {}, {}",
            Column::ModifyDate.name(),
            Column::DataId.name()
        ));

        if let (Some(limit), RowLimit::Limit) = (self.limit, dialect.row_limit) {
            out.sql.push_str(&format!(" limit {}", limit));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::Cursor;
    use crate::predicate::{Bind, Predicate};
    use chrono::NaiveDate;

    #[test]
    fn test_unfiltered_query() {
        let sql = NodeQuery::new(Fragment::absent())
            .to_sql(&Dialect::livelink())
            .sql;
        assert_eq!(
            sql,
            "select DataID, ParentID, SubType, ModifyDate, CreateDate, Name \
             from WebNodes order by ModifyDate, DataID"
        );
    }

    #[test]
    fn test_limit_styles() {
        let query = NodeQuery::new(Fragment::absent()).with_limit(25);

        let sqlite = query.to_sql(&Dialect::livelink()).sql;
        assert!(sqlite.starts_with("select DataID"));
        assert!(sqlite.ends_with("order by ModifyDate, DataID limit 25"));

        let sql_server = query.to_sql(&Dialect::sql_server()).sql;
        assert!(sql_server.starts_with("select top 25 DataID"));
        assert!(sql_server.ends_with("order by ModifyDate, DataID"));
    }

    #[test]
    fn test_filtered_query_carries_binds() {
        let modified = NaiveDate::from_ymd_opt(2008, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let filter = Fragment::of(Predicate::not_in_list(Column::SubType, [137]))
            .and(Predicate::After(Cursor::new(modified, 9)).into());

        let rendered = NodeQuery::new(filter).with_limit(2).to_sql(&Dialect::livelink());

        assert_eq!(
            rendered.sql,
            "select DataID, ParentID, SubType, ModifyDate, CreateDate, Name from WebNodes \
             where SubType not in (137) and (ModifyDate > ? or (ModifyDate = ? and DataID > ?)) \
             order by ModifyDate, DataID limit 2"
        );
        assert_eq!(rendered.binds.len(), 3);
        assert_eq!(rendered.binds[2], Bind::Integer(9));
    }
}
