use crate::error::{IngestError, QueryError, SessionError};
use chrono::{DateTime, Duration, Utc};
use cth_analysis::{AnalyzerConfig, PropagationAnalyzer};
use cth_graph::{CthGraph, GraphStatistics};
use cth_ingest::{validate_document, BuilderConfig, CthBuilder};
use serde::Deserialize;
use serde_json::Value;
use std::sync::RwLock;
use tracing::info;

/// One diagnostic context: at most one graph, built from the most recent
/// ingestion, plus the builder and analyzer that operate on it.
///
/// The graph sits behind an `RwLock`: ingestion takes the write lock and
/// replaces it wholesale, queries share the read lock. Methods take `&self`
/// so a session can be shared via `Arc` across request handlers.
pub struct DiagnosticSession {
    graph: RwLock<Option<CthGraph>>,
    builder: CthBuilder,
    pub(crate) analyzer: PropagationAnalyzer,
    created_at: DateTime<Utc>,
    last_active_at: RwLock<DateTime<Utc>>,
}

impl std::fmt::Debug for DiagnosticSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosticSession")
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

impl Default for DiagnosticSession {
    fn default() -> Self {
        Self::new(BuilderConfig::default(), AnalyzerConfig::default())
    }
}

impl DiagnosticSession {
    pub fn new(builder: BuilderConfig, analyzer: AnalyzerConfig) -> Self {
        let now = Utc::now();
        Self {
            graph: RwLock::new(None),
            builder: CthBuilder::new(builder),
            analyzer: PropagationAnalyzer::new(analyzer),
            created_at: now,
            last_active_at: RwLock::new(now),
        }
    }

    /// Validate, parse, and build a graph from `doc`, replacing whatever
    /// graph the session held before. On validation failure every issue is
    /// returned and the existing graph is left untouched.
    pub fn ingest(&self, doc: &Value) -> Result<GraphStatistics, IngestError> {
        let issues = validate_document(doc);
        if !issues.is_empty() {
            return Err(IngestError::Validation { issues });
        }

        let batch = cth_ingest::TelemetryBatch::deserialize(doc)?;
        let graph = self.builder.build(&batch);
        let stats = graph.statistics();

        {
            let mut slot = self.graph.write().map_err(|_| SessionError::Lock)?;
            *slot = Some(graph);
        }
        self.touch();

        info!(
            edges = stats.total_edges,
            nodes = stats.total_nodes,
            "session graph replaced"
        );
        Ok(stats)
    }

    /// Run `f` against the session's graph under the read lock.
    pub(crate) fn with_graph<T>(
        &self,
        f: impl FnOnce(&CthGraph) -> T,
    ) -> Result<T, QueryError> {
        let guard = self.graph.read().map_err(|_| QueryError::Lock)?;
        let graph = guard.as_ref().ok_or(QueryError::NoGraph)?;
        Ok(f(graph))
    }

    pub fn has_graph(&self) -> bool {
        self.graph.read().map(|g| g.is_some()).unwrap_or(false)
    }

    /// Edge count of the current graph, if one exists.
    pub fn graph_len(&self) -> Option<usize> {
        self.graph.read().ok()?.as_ref().map(|g| g.len())
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_active_at(&self) -> DateTime<Utc> {
        self.last_active_at
            .read()
            .map(|t| *t)
            .unwrap_or(self.created_at)
    }

    /// Mark the session as used now.
    pub fn touch(&self) {
        if let Ok(mut t) = self.last_active_at.write() {
            *t = Utc::now();
        }
    }

    /// Idle longer than `timeout`?
    pub fn is_expired(&self, timeout: Duration) -> bool {
        Utc::now() - self.last_active_at() > timeout
    }
}
