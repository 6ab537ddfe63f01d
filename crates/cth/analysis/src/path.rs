use chrono::{DateTime, Utc};
use cth_types::{EdgeId, EntityId, Hyperedge, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One candidate fault propagation path: a time-ordered hyperedge sequence
/// with the cumulative probability the search assigned to it.
#[derive(Clone, Debug)]
pub struct PropagationPath {
    pub hyperedges: Vec<Hyperedge>,
    pub probability: f64,
    /// Union of all node sets along the path.
    pub total_nodes: BTreeSet<EntityId>,
}

impl PropagationPath {
    pub fn new(hyperedges: Vec<Hyperedge>, probability: f64) -> Self {
        let total_nodes = hyperedges
            .iter()
            .flat_map(|e| e.nodes.iter().cloned())
            .collect();
        Self {
            hyperedges,
            probability,
            total_nodes,
        }
    }

    pub fn len(&self) -> usize {
        self.hyperedges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hyperedges.is_empty()
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.hyperedges.first().map(|e| e.timestamp)
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.hyperedges.last().map(|e| e.timestamp)
    }

    /// Wall-clock span from first to last hyperedge, in seconds.
    pub fn duration_secs(&self) -> Option<f64> {
        match (self.start_time(), self.end_time()) {
            (Some(start), Some(end)) => {
                Some((end - start).num_milliseconds() as f64 / 1000.0)
            }
            _ => None,
        }
    }

    /// Serializable digest of the path. `None` for an empty path, which the
    /// search never produces.
    pub fn summary(&self) -> Option<PathSummary> {
        let start = self.start_time()?;
        let end = self.end_time()?;
        Some(PathSummary {
            path_length: self.hyperedges.len(),
            start_time: start,
            end_time: end,
            total_duration_secs: (end - start).num_milliseconds() as f64 / 1000.0,
            affected_nodes: self.total_nodes.iter().cloned().collect(),
            node_count: self.total_nodes.len(),
            probability: self.probability,
            severity_progression: self.hyperedges.iter().map(|e| e.severity).collect(),
            edge_ids: self.hyperedges.iter().map(|e| e.edge_id.clone()).collect(),
        })
    }
}

/// Digest of a [`PropagationPath`] for reports and query responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PathSummary {
    pub path_length: usize,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub total_duration_secs: f64,
    pub affected_nodes: Vec<EntityId>,
    pub node_count: usize,
    pub probability: f64,
    pub severity_progression: Vec<Severity>,
    pub edge_ids: Vec<EdgeId>,
}
