//! Helpers for populating a test repository.

use sqlx::SqlitePool;

/// Insert a node into both `DTree` and `WebNodes`.
///
/// `modify_date` uses the `yyyy-MM-dd HH:mm:ss` layout the repository stores.
pub async fn insert_node(
    pool: &SqlitePool,
    data_id: i64,
    parent_id: i64,
    subtype: i64,
    modify_date: &str,
) -> Result<(), sqlx::Error> {
    let name = format!("node-{}", data_id);

    for table in ["DTree", "WebNodes"] {
        sqlx::query(&format!(
            "INSERT INTO {} (DataID, ParentID, SubType, ModifyDate, CreateDate, Name) \
             VALUES (?, ?, ?, ?, ?, ?)",
            table
        ))
        .bind(data_id)
        .bind(parent_id)
        .bind(subtype)
        .bind(modify_date)
        .bind(modify_date)
        .bind(name.as_str())
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// Record that `data_id` sits below each of `ancestors`.
pub async fn insert_ancestors(
    pool: &SqlitePool,
    data_id: i64,
    ancestors: &[i64],
) -> Result<(), sqlx::Error> {
    for ancestor in ancestors {
        sqlx::query("INSERT INTO DTreeAncestors (DataID, AncestorID) VALUES (?, ?)")
            .bind(data_id)
            .bind(*ancestor)
            .execute(pool)
            .await?;
    }
    Ok(())
}
