use crate::error::QueryError;
use crate::session::DiagnosticSession;
use cth_analysis::{PathReport, DEFAULT_MAX_PATHS};
use cth_graph::GraphStatistics;
use cth_types::{EntityId, Hyperedge, Severity};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The closed query surface over a session's graph.
///
/// Tagged with the operation name, so the wire form is
/// `{"query_type": "query_nodes_by_entity", "entity": "service:frontend"}`
/// and an unknown operation fails to deserialize instead of reaching
/// dispatch.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "query_type", rename_all = "snake_case")]
pub enum GraphQuery {
    /// All hyperedges containing the given entity.
    QueryNodesByEntity { entity: String },
    /// All edges carrying an anomaly signal, optionally filtered to an
    /// exact severity.
    QueryAnomalousEvents {
        #[serde(default)]
        severity: Option<Severity>,
    },
    /// Ranked propagation paths from a start node.
    FindPropagationPaths {
        start_node: String,
        #[serde(default)]
        max_paths: Option<usize>,
    },
    GetGraphStatistics,
}

/// Successful query results. Empty collections are valid answers.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum QueryResponse {
    Nodes {
        entity: String,
        hyperedges_count: usize,
        hyperedges: Vec<Hyperedge>,
    },
    AnomalousEvents {
        anomalous_events_count: usize,
        events: Vec<Hyperedge>,
    },
    PropagationPaths {
        start_node: String,
        paths_found: usize,
        paths: Vec<PathReport>,
    },
    Statistics(GraphStatistics),
}

impl DiagnosticSession {
    /// Answer a query against the session's current graph. Fails with
    /// [`QueryError::NoGraph`] when nothing has been ingested yet.
    pub fn query(&self, query: &GraphQuery) -> Result<QueryResponse, QueryError> {
        self.touch();
        let response = self.with_graph(|graph| match query {
            GraphQuery::QueryNodesByEntity { entity } => {
                let node = EntityId::parse(entity);
                let hyperedges: Vec<Hyperedge> = graph
                    .get_hyperedges_containing(&node)
                    .into_iter()
                    .cloned()
                    .collect();
                debug!(entity = %node, hits = hyperedges.len(), "entity query");
                QueryResponse::Nodes {
                    entity: entity.clone(),
                    hyperedges_count: hyperedges.len(),
                    hyperedges,
                }
            }
            GraphQuery::QueryAnomalousEvents { severity } => {
                let events: Vec<Hyperedge> = graph
                    .iter_time_ordered()
                    .filter(|e| e.is_anomalous())
                    .filter(|e| severity.map_or(true, |s| e.severity == s))
                    .cloned()
                    .collect();
                QueryResponse::AnomalousEvents {
                    anomalous_events_count: events.len(),
                    events,
                }
            }
            GraphQuery::FindPropagationPaths {
                start_node,
                max_paths,
            } => {
                let start = EntityId::parse(start_node);
                let paths = self.analyzer.find_propagation_paths(
                    graph,
                    &start,
                    max_paths.unwrap_or(DEFAULT_MAX_PATHS),
                );
                let paths: Vec<PathReport> = paths
                    .iter()
                    .filter_map(|p| {
                        Some(PathReport {
                            summary: p.summary()?,
                            hyperedges: p.hyperedges.clone(),
                        })
                    })
                    .collect();
                QueryResponse::PropagationPaths {
                    start_node: start_node.clone(),
                    paths_found: paths.len(),
                    paths,
                }
            }
            GraphQuery::GetGraphStatistics => QueryResponse::Statistics(graph.statistics()),
        })?;
        Ok(response)
    }
}
