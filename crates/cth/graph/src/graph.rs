use crate::error::GraphError;
use crate::stats::{GraphMetadata, GraphStatistics};
use chrono::{DateTime, Utc};
use cth_types::{EdgeId, EntityId, Hyperedge};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// The Causal-Temporal Hypergraph accumulator.
///
/// Grows append-only through [`CthGraph::add_hyperedge`]; edges are never
/// removed or mutated in place. `clear` resets to the empty state with
/// fresh metadata.
#[derive(Debug, Default)]
pub struct CthGraph {
    hyperedges: HashMap<EdgeId, Hyperedge>,
    /// Inverted index: entity -> ids of edges containing it.
    node_to_edges: HashMap<EntityId, HashSet<EdgeId>>,
    /// Edge ids sorted ascending by timestamp. Equal timestamps keep
    /// insertion order (new edges land after existing equals).
    time_ordered: Vec<EdgeId>,
    metadata: GraphMetadata,
}

impl CthGraph {
    pub fn new() -> Self {
        Self {
            hyperedges: HashMap::new(),
            node_to_edges: HashMap::new(),
            time_ordered: Vec::new(),
            metadata: GraphMetadata::new(),
        }
    }

    /// Insert a hyperedge, updating both derived indices.
    ///
    /// Rejects an already-present `edge_id` with
    /// [`GraphError::DuplicateEdge`]; re-ingesting the identical event is
    /// a caller error, and overwriting would silently merge histories.
    pub fn add_hyperedge(&mut self, edge: Hyperedge) -> Result<(), GraphError> {
        if self.hyperedges.contains_key(&edge.edge_id) {
            return Err(GraphError::DuplicateEdge(edge.edge_id));
        }

        // Insertion point: after every existing edge with timestamp <= new.
        let at = self
            .time_ordered
            .partition_point(|id| self.hyperedges[id].timestamp <= edge.timestamp);

        let edge_id = edge.edge_id.clone();
        for node in &edge.nodes {
            self.node_to_edges
                .entry(node.clone())
                .or_default()
                .insert(edge_id.clone());
        }
        self.time_ordered.insert(at, edge_id.clone());
        debug!(%edge_id, nodes = edge.nodes.len(), severity = %edge.severity, "hyperedge added");
        self.hyperedges.insert(edge_id, edge);

        self.metadata.total_events += 1;
        self.metadata.last_updated = Some(Utc::now());
        Ok(())
    }

    pub fn get(&self, id: &EdgeId) -> Option<&Hyperedge> {
        self.hyperedges.get(id)
    }

    pub fn len(&self) -> usize {
        self.hyperedges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hyperedges.is_empty()
    }

    pub fn metadata(&self) -> &GraphMetadata {
        &self.metadata
    }

    /// All hyperedges in ascending timestamp order.
    pub fn iter_time_ordered(&self) -> impl Iterator<Item = &Hyperedge> + '_ {
        self.time_ordered.iter().map(|id| &self.hyperedges[id])
    }

    /// All hyperedges containing `node`. O(1) index lookup; an unseen
    /// entity yields an empty vec, which is a valid result, not an error.
    pub fn get_hyperedges_containing(&self, node: &EntityId) -> Vec<&Hyperedge> {
        match self.node_to_edges.get(node) {
            Some(ids) => ids.iter().map(|id| &self.hyperedges[id]).collect(),
            None => Vec::new(),
        }
    }

    /// Hyperedges with `start <= timestamp <= end`, in timestamp order.
    /// Scans the sorted list and stops as soon as it passes `end`.
    pub fn get_hyperedges_in_timerange(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<&Hyperedge> {
        let mut result = Vec::new();
        for edge in self.iter_time_ordered() {
            if edge.timestamp > end {
                break;
            }
            if edge.timestamp >= start {
                result.push(edge);
            }
        }
        result
    }

    /// The propagation adjacency rule, computed on demand and never cached:
    /// candidate successors of `current` are the edges strictly later in
    /// time, not yet visited, whose node set intersects `current`'s.
    pub fn find_next_hyperedges(
        &self,
        current: &Hyperedge,
        visited: &HashSet<EdgeId>,
    ) -> Vec<&Hyperedge> {
        // Everything at or before current.timestamp is excluded, so the
        // scan can start past it in the sorted list.
        let from = self
            .time_ordered
            .partition_point(|id| self.hyperedges[id].timestamp <= current.timestamp);

        self.time_ordered[from..]
            .iter()
            .map(|id| &self.hyperedges[id])
            .filter(|e| {
                e.edge_id != current.edge_id
                    && !visited.contains(&e.edge_id)
                    && current.intersects(e)
            })
            .collect()
    }

    pub fn statistics(&self) -> GraphStatistics {
        let earliest = self
            .time_ordered
            .first()
            .map(|id| self.hyperedges[id].timestamp);
        let latest = self
            .time_ordered
            .last()
            .map(|id| self.hyperedges[id].timestamp);
        let time_span_seconds = match (earliest, latest) {
            (Some(e), Some(l)) if self.len() > 1 => {
                (l - e).num_milliseconds() as f64 / 1000.0
            }
            _ => 0.0,
        };

        let mut all_nodes: HashSet<&EntityId> = HashSet::new();
        for edge in self.hyperedges.values() {
            all_nodes.extend(edge.nodes.iter());
        }

        GraphStatistics {
            total_edges: self.hyperedges.len(),
            total_nodes: all_nodes.len(),
            time_span_seconds,
            earliest_event: earliest,
            latest_event: latest,
            metadata: self.metadata.clone(),
        }
    }

    /// Reset to the empty state with fresh metadata.
    pub fn clear(&mut self) {
        self.hyperedges.clear();
        self.node_to_edges.clear();
        self.time_ordered.clear();
        self.metadata = GraphMetadata::new();
        debug!("graph cleared");
    }

    /// Check every structural invariant:
    ///
    /// (a) the inverted index is exactly the inverse of the edge node sets,
    /// (b) `time_ordered` is non-decreasing by timestamp,
    /// (c) the ordered list and the edge map hold the same id set,
    /// (d) every stored edge id matches its recomputed content hash.
    ///
    /// A violation is a defect in this crate, not a runtime condition;
    /// the method exists so tests can assert it after arbitrary operation
    /// sequences.
    pub fn verify_integrity(&self) -> Result<(), GraphError> {
        if self.time_ordered.len() != self.hyperedges.len() {
            return Err(GraphError::InvariantViolation(format!(
                "ordered list has {} ids but map has {} edges",
                self.time_ordered.len(),
                self.hyperedges.len()
            )));
        }

        let mut seen: HashSet<&EdgeId> = HashSet::new();
        let mut prev: Option<DateTime<Utc>> = None;
        for id in &self.time_ordered {
            let edge = self.hyperedges.get(id).ok_or_else(|| {
                GraphError::InvariantViolation(format!("ordered id {} missing from edge map", id))
            })?;
            if !seen.insert(id) {
                return Err(GraphError::InvariantViolation(format!(
                    "edge {} appears twice in ordered list",
                    id
                )));
            }
            if let Some(p) = prev {
                if edge.timestamp < p {
                    return Err(GraphError::InvariantViolation(format!(
                        "temporal order broken at edge {}",
                        id
                    )));
                }
            }
            prev = Some(edge.timestamp);
        }

        for (node, ids) in &self.node_to_edges {
            for id in ids {
                let edge = self.hyperedges.get(id).ok_or_else(|| {
                    GraphError::InvariantViolation(format!(
                        "index entry {} -> {} missing from edge map",
                        node, id
                    ))
                })?;
                if !edge.nodes.contains(node) {
                    return Err(GraphError::InvariantViolation(format!(
                        "edge {} indexed under {} but does not contain it",
                        id, node
                    )));
                }
            }
        }
        for edge in self.hyperedges.values() {
            for node in &edge.nodes {
                let indexed = self
                    .node_to_edges
                    .get(node)
                    .is_some_and(|ids| ids.contains(&edge.edge_id));
                if !indexed {
                    return Err(GraphError::InvariantViolation(format!(
                        "edge {} contains {} but is not indexed under it",
                        edge.edge_id, node
                    )));
                }
            }
            if !edge.verify_id() {
                return Err(GraphError::InvariantViolation(format!(
                    "edge {} id does not match its content",
                    edge.edge_id
                )));
            }
        }

        Ok(())
    }

    /// Structured, lossless form: hyperedges (in time order) plus metadata.
    /// Indices are derived state and are rebuilt on restore.
    pub fn to_snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            hyperedges: self.iter_time_ordered().cloned().collect(),
            metadata: self.metadata.clone(),
        }
    }

    /// Rebuild a graph from its snapshot, re-deriving both indices and
    /// re-verifying every edge id along the way.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for edge in snapshot.hyperedges {
            if !edge.verify_id() {
                return Err(GraphError::InvariantViolation(format!(
                    "snapshot edge {} id does not match its content",
                    edge.edge_id
                )));
            }
            graph.add_hyperedge(edge)?;
        }
        graph.metadata = snapshot.metadata;
        Ok(graph)
    }
}

/// Serializable form of a [`CthGraph`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub hyperedges: Vec<Hyperedge>,
    pub metadata: GraphMetadata,
}
