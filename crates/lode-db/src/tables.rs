use redb::TableDefinition;

/// Table for storing encoded traversal checkpoints.
/// Key: connector name
/// Value: `Checkpoint::encode` output
pub const CHECKPOINTS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("checkpoints");
