use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version tag stamped into every graph's metadata.
pub const GRAPH_VERSION: &str = "1.0";

/// Bookkeeping carried alongside the hyperedge store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphMetadata {
    pub created_at: DateTime<Utc>,
    pub version: String,
    /// Running count of accepted hyperedges over the graph's lifetime.
    pub total_events: u64,
    pub last_updated: Option<DateTime<Utc>>,
}

impl GraphMetadata {
    pub fn new() -> Self {
        Self {
            created_at: Utc::now(),
            version: GRAPH_VERSION.to_string(),
            total_events: 0,
            last_updated: None,
        }
    }
}

impl Default for GraphMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregate view of a graph's contents.
///
/// An empty graph reports zero edges, zero nodes, and a zero time span.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GraphStatistics {
    pub total_edges: usize,
    pub total_nodes: usize,
    pub time_span_seconds: f64,
    pub earliest_event: Option<DateTime<Utc>>,
    pub latest_event: Option<DateTime<Utc>>,
    pub metadata: GraphMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_metadata() {
        let m = GraphMetadata::new();
        assert_eq!(m.version, GRAPH_VERSION);
        assert_eq!(m.total_events, 0);
        assert!(m.last_updated.is_none());
    }

    #[test]
    fn metadata_serde_roundtrip() {
        let m = GraphMetadata::new();
        let json = serde_json::to_string(&m).unwrap();
        let back: GraphMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }
}
