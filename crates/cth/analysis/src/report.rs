use crate::analyzer::{PropagationAnalyzer, DEFAULT_MAX_PATHS};
use crate::path::PathSummary;
use crate::scope::{quantify_propagation_scope, ScopeAnalysis};
use chrono::{DateTime, Utc};
use cth_graph::{CthGraph, GraphStatistics};
use cth_types::{EntityId, EntityKind, Hyperedge, Severity};
use serde::{Deserialize, Serialize};
use tracing::info;

/// One path in the report: digest plus the full hyperedges for drill-down.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PathReport {
    pub summary: PathSummary,
    pub hyperedges: Vec<Hyperedge>,
}

/// The complete diagnostic artifact for one anomalous start node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PropagationReport {
    pub analysis_timestamp: DateTime<Utc>,
    pub anomaly_start_node: EntityId,
    pub total_paths_found: usize,
    pub propagation_paths: Vec<PathReport>,
    pub scope_analysis: ScopeAnalysis,
    pub graph_statistics: GraphStatistics,
    pub recommendations: Vec<String>,
}

impl PropagationAnalyzer {
    /// Run the full pipeline for `start`: path search, scope quantification,
    /// graph statistics, recommendations.
    pub fn generate_report(&self, graph: &CthGraph, start: &EntityId) -> PropagationReport {
        let paths = self.find_propagation_paths(graph, start, DEFAULT_MAX_PATHS);
        let scope_analysis = quantify_propagation_scope(&paths);
        info!(
            node = %start,
            paths = paths.len(),
            severity = %scope_analysis.scope_severity,
            "propagation report generated"
        );
        PropagationReport {
            analysis_timestamp: Utc::now(),
            anomaly_start_node: start.clone(),
            total_paths_found: paths.len(),
            propagation_paths: paths
                .iter()
                .filter_map(|p| {
                    Some(PathReport {
                        summary: p.summary()?,
                        hyperedges: p.hyperedges.clone(),
                    })
                })
                .collect(),
            recommendations: recommendations(&scope_analysis),
            scope_analysis,
            graph_statistics: graph.statistics(),
        }
    }
}

/// Actionable guidance derived from the scope report. Pure function of its
/// input; the rules fire independently and in a fixed order.
pub fn recommendations(scope: &ScopeAnalysis) -> Vec<String> {
    let mut out = Vec::new();

    match scope.scope_severity {
        Severity::Critical => {
            out.push(
                "Initiate incident response immediately; this is a severe system-level fault"
                    .to_string(),
            );
            out.push("Consider activating the disaster recovery plan".to_string());
        }
        Severity::Error => {
            out.push("Urgent attention required; the fault is propagating quickly".to_string());
            out.push("Check the health of core services".to_string());
        }
        _ => {}
    }

    if scope
        .node_type_counts
        .get(&EntityKind::Service)
        .is_some_and(|&n| n > 3)
    {
        out.push("Multiple services affected; review inter-service dependencies".to_string());
    }
    if scope
        .node_type_counts
        .get(&EntityKind::Node)
        .is_some_and(|&n| n > 1)
    {
        out.push("Multiple nodes affected; this may be an infrastructure problem".to_string());
    }

    // More than one node per second.
    if scope.propagation_velocity > 1.0 {
        out.push(
            "Fault propagation is fast; isolate the affected components immediately".to_string(),
        );
    }

    if let Some(top) = scope.core_components.first() {
        let nodes: Vec<String> = top.nodes.iter().map(|n| n.canonical()).collect();
        out.push(format!("Focus on the core component: {}", nodes.join(", ")));
    }

    if out.is_empty() {
        out.push("Continue monitoring; the current impact is limited".to_string());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PropagationPath;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn edge(ids: &[&str], secs: i64, severity: Severity) -> Hyperedge {
        let nodes = ids.iter().map(|s| EntityId::parse(s)).collect();
        Hyperedge::new(nodes, ts(secs)).unwrap().with_severity(severity)
    }

    fn scope_of(paths: &[PropagationPath]) -> ScopeAnalysis {
        quantify_propagation_scope(paths)
    }

    #[test]
    fn critical_scope_triggers_incident_response() {
        let paths = vec![PropagationPath::new(
            vec![
                edge(&["service:a"], 100, Severity::Critical),
                edge(&["service:a", "service:b"], 160, Severity::Critical),
            ],
            0.9,
        )];
        let recs = recommendations(&scope_of(&paths));
        assert!(recs.iter().any(|r| r.contains("incident response")));
        assert!(recs.iter().any(|r| r.contains("disaster recovery")));
    }

    #[test]
    fn wide_service_impact_flags_dependencies() {
        let paths = vec![PropagationPath::new(
            vec![
                edge(&["service:a", "service:b"], 100, Severity::Normal),
                edge(&["service:c", "service:d"], 160, Severity::Normal),
            ],
            0.5,
        )];
        let recs = recommendations(&scope_of(&paths));
        assert!(recs.iter().any(|r| r.contains("inter-service dependencies")));
    }

    #[test]
    fn multi_node_impact_flags_infrastructure() {
        let paths = vec![PropagationPath::new(
            vec![
                edge(&["node:n1"], 100, Severity::Normal),
                edge(&["node:n1", "node:n2"], 160, Severity::Normal),
            ],
            0.5,
        )];
        let recs = recommendations(&scope_of(&paths));
        assert!(recs.iter().any(|r| r.contains("infrastructure")));
    }

    #[test]
    fn fast_propagation_flags_isolation() {
        // 3 nodes in 2 seconds: velocity 1.5 nodes/sec.
        let paths = vec![PropagationPath::new(
            vec![
                edge(&["service:a"], 100, Severity::Normal),
                edge(&["service:b", "service:c"], 102, Severity::Normal),
            ],
            0.5,
        )];
        let recs = recommendations(&scope_of(&paths));
        assert!(recs.iter().any(|r| r.contains("isolate")));
    }

    #[test]
    fn quiet_scope_recommends_monitoring_only() {
        let recs = recommendations(&ScopeAnalysis::default());
        assert_eq!(recs.len(), 1);
        assert!(recs[0].contains("Continue monitoring"));
    }

    #[test]
    fn core_component_named_when_paths_exist() {
        let paths = vec![PropagationPath::new(
            vec![edge(&["service:a", "pod:p"], 100, Severity::Normal)],
            1.0,
        )];
        let recs = recommendations(&scope_of(&paths));
        assert!(recs
            .iter()
            .any(|r| r.contains("core component") && r.contains("service:a")));
    }

    #[test]
    fn report_end_to_end() {
        let mut graph = CthGraph::new();
        graph
            .add_hyperedge(edge(&["service:a"], 100, Severity::Error))
            .unwrap();
        graph
            .add_hyperedge(edge(&["service:a", "service:b"], 160, Severity::Critical))
            .unwrap();

        let report =
            PropagationAnalyzer::default().generate_report(&graph, &EntityId::service("a"));
        assert_eq!(report.anomaly_start_node, EntityId::service("a"));
        assert!(report.total_paths_found > 0);
        assert_eq!(report.propagation_paths.len(), report.total_paths_found);
        assert_eq!(report.graph_statistics.total_edges, 2);
        assert!(!report.recommendations.is_empty());

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["scope_analysis"]["scope_severity"].is_string());
        assert!(json["propagation_paths"][0]["summary"]["probability"].is_number());
    }

    #[test]
    fn report_for_unknown_node_is_empty_but_valid() {
        let graph = CthGraph::new();
        let report =
            PropagationAnalyzer::default().generate_report(&graph, &EntityId::service("ghost"));
        assert_eq!(report.total_paths_found, 0);
        assert_eq!(report.scope_analysis.total_affected_nodes, 0);
        assert_eq!(report.recommendations.len(), 1);
    }
}
