use crate::edge_id::EdgeId;
use crate::entity::EntityId;
use crate::error::TypeParseError;
use crate::severity::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How a hyperedge came to exist.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Derived from a distributed trace with anomaly signals.
    TraceEvent,
    /// Grouped from anomalous metrics/logs not covered by any trace.
    OrphanedAnomaly,
    #[default]
    Unknown,
}

/// One joint event: the set of entities that participated together, plus
/// the anomalous signals observed while it happened.
///
/// Immutable once created; graphs only append hyperedges, never mutate
/// them in place. The `edge_id` is derived from the node set and timestamp
/// at construction and preserved verbatim through serialization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hyperedge {
    pub edge_id: EdgeId,
    /// Entities involved in the event. Non-empty by construction.
    pub nodes: BTreeSet<EntityId>,
    /// Anomalous metric identifiers (`entity:metric_name`).
    pub metrics: BTreeSet<String>,
    /// Critical log excerpts, truncated to 100 chars at ingestion.
    pub logs: BTreeSet<String>,
    /// Event start time.
    pub timestamp: DateTime<Utc>,
    pub trace_id: Option<String>,
    pub event_type: EventType,
    pub severity: Severity,
    /// Event duration in seconds, when the source trace had an end time.
    pub duration_secs: Option<f64>,
}

impl Hyperedge {
    /// Create a hyperedge with its content-addressed id.
    ///
    /// Fails only on an empty node set, since a hyperedge that involves no
    /// entity is meaningless and would poison the inverted index.
    pub fn new(
        nodes: BTreeSet<EntityId>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, TypeParseError> {
        if nodes.is_empty() {
            return Err(TypeParseError::EmptyNodeSet);
        }
        let edge_id = EdgeId::derive(&nodes, &timestamp);
        Ok(Self {
            edge_id,
            nodes,
            metrics: BTreeSet::new(),
            logs: BTreeSet::new(),
            timestamp,
            trace_id: None,
            event_type: EventType::Unknown,
            severity: Severity::Normal,
            duration_secs: None,
        })
    }

    pub fn with_metrics(mut self, metrics: BTreeSet<String>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_logs(mut self, logs: BTreeSet<String>) -> Self {
        self.logs = logs;
        self
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn with_event_type(mut self, event_type: EventType) -> Self {
        self.event_type = event_type;
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_duration_secs(mut self, duration_secs: f64) -> Self {
        self.duration_secs = Some(duration_secs);
        self
    }

    /// Recompute the id from the node set and timestamp and compare against
    /// the stored one. A mismatch means the record was tampered with or
    /// corrupted in transit.
    pub fn verify_id(&self) -> bool {
        EdgeId::derive(&self.nodes, &self.timestamp) == self.edge_id
    }

    /// Does this hyperedge share at least one entity with `other`?
    /// This is the node half of the propagation adjacency rule.
    pub fn intersects(&self, other: &Hyperedge) -> bool {
        // Iterate the smaller set.
        let (small, large) = if self.nodes.len() <= other.nodes.len() {
            (&self.nodes, &other.nodes)
        } else {
            (&other.nodes, &self.nodes)
        };
        small.iter().any(|n| large.contains(n))
    }

    pub fn intersection_count(&self, other: &Hyperedge) -> usize {
        let (small, large) = if self.nodes.len() <= other.nodes.len() {
            (&self.nodes, &other.nodes)
        } else {
            (&other.nodes, &self.nodes)
        };
        small.iter().filter(|n| large.contains(*n)).count()
    }

    pub fn union_count(&self, other: &Hyperedge) -> usize {
        self.nodes.len() + other.nodes.len() - self.intersection_count(other)
    }

    /// Whether this edge carries any anomaly signal at all.
    pub fn is_anomalous(&self) -> bool {
        !self.metrics.is_empty() || !self.logs.is_empty() || self.severity != Severity::Normal
    }
}
