use lode_core::NodeRow;
use lode_traversal::{BatchSink, SinkError};

/// Sink that reports delivered nodes to the log.
///
/// Stands in for the search index feed when the connector runs standalone.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl BatchSink for LogSink {
    async fn deliver(&self, nodes: &[NodeRow]) -> Result<(), SinkError> {
        for node in nodes {
            tracing::debug!(
                "Node {} (subtype {}, parent {}) modified {}",
                node.id,
                node.subtype,
                node.parent_id,
                node.modify_date
            );
        }
        if let (Some(first), Some(last)) = (nodes.first(), nodes.last()) {
            tracing::info!(
                "Delivered {} nodes, {} through {}",
                nodes.len(),
                first.id,
                last.id
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use lode_core::NodeId;

    #[tokio::test]
    async fn test_log_sink_accepts_everything() {
        let modified = NaiveDate::from_ymd_opt(2007, 9, 27)
            .unwrap()
            .and_hms_opt(1, 12, 13)
            .unwrap();
        let node = NodeRow {
            id: NodeId(42),
            parent_id: NodeId(2000),
            subtype: 144,
            modify_date: modified,
            create_date: None,
            name: None,
        };

        assert!(LogSink.deliver(&[node]).await.is_ok());
        assert!(LogSink.deliver(&[]).await.is_ok());
    }
}
