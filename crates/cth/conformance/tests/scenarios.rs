//! End-to-end scenarios across ingestion, graph storage, analysis, and
//! session dispatch.

use chrono::{DateTime, TimeZone, Utc};
use cth_analysis::{quantify_propagation_scope, PropagationAnalyzer, DEFAULT_MAX_PATHS};
use cth_graph::CthGraph;
use cth_ingest::{CthBuilder, TelemetryBatch};
use cth_session::{DiagnosticSession, GraphQuery, QueryError, QueryResponse};
use cth_types::{EntityId, EventType, Hyperedge, Severity};
use serde_json::json;

fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn edge(ids: &[&str], secs: i64, severity: Severity) -> Hyperedge {
    let nodes = ids.iter().map(|s| EntityId::parse(s)).collect();
    Hyperedge::new(nodes, ts(secs)).unwrap().with_severity(severity)
}

fn build(doc: serde_json::Value) -> CthGraph {
    let batch: TelemetryBatch = serde_json::from_value(doc).unwrap();
    CthBuilder::default().build(&batch)
}

/// An errored span plus a correlated anomalous metric and a critical log
/// become exactly one hyperedge, with the span status setting the severity.
#[test]
fn error_trace_with_signals_yields_one_error_edge() {
    let graph = build(json!({
        "traces": [{
            "trace_id": "trace-a",
            "spans": [{
                "service": "frontend",
                "operation": "checkout",
                "start_time": "2024-01-01T10:00:00Z",
                "end_time": "2024-01-01T10:00:02Z",
                "status": "error"
            }]
        }],
        "metrics": [{
            "entity": "frontend",
            "metric_name": "cpu_usage",
            "value": 97.0,
            "timestamp": "2024-01-01T10:00:00Z",
            "is_anomalous": true,
            "trace_id": "trace-a"
        }],
        "logs": [{
            "entity": "frontend",
            "message": "upstream timeout while calling payments",
            "level": "warn",
            "timestamp": "2024-01-01T10:00:01Z",
            "trace_id": "trace-a"
        }]
    }));

    assert_eq!(graph.len(), 1);
    let edge = graph.iter_time_ordered().next().unwrap();
    assert_eq!(edge.severity, Severity::Error);
    assert_eq!(edge.event_type, EventType::TraceEvent);
    assert!(edge.nodes.contains(&EntityId::service("frontend")));
    assert!(edge.metrics.contains("frontend:cpu_usage"));
    assert_eq!(edge.logs.len(), 1);
    assert!(edge.verify_id());
}

/// A healthy trace with no anomaly signal leaves the graph empty.
#[test]
fn healthy_trace_yields_no_edges() {
    let graph = build(json!({
        "traces": [{
            "trace_id": "trace-b",
            "spans": [{
                "service": "frontend",
                "start_time": "2024-01-01T10:00:00Z",
                "end_time": "2024-01-01T10:00:01Z",
                "status": "ok"
            }]
        }],
        "metrics": [],
        "logs": []
    }));
    assert!(graph.is_empty());
}

/// Two overlapping edges, warning then error ten seconds apart, form a
/// propagation path with escalating severity.
#[test]
fn propagation_path_with_severity_progression() {
    let mut graph = CthGraph::new();
    graph
        .add_hyperedge(edge(&["service:frontend"], 1000, Severity::Warning))
        .unwrap();
    graph
        .add_hyperedge(edge(
            &["service:frontend", "service:backend"],
            1010,
            Severity::Error,
        ))
        .unwrap();

    let paths = PropagationAnalyzer::default().find_propagation_paths(
        &graph,
        &EntityId::service("frontend"),
        DEFAULT_MAX_PATHS,
    );

    let two_edge = paths.iter().find(|p| p.len() == 2).unwrap();
    assert!(two_edge.probability >= 0.1);
    let summary = two_edge.summary().unwrap();
    assert_eq!(
        summary.severity_progression,
        vec![Severity::Warning, Severity::Error]
    );
}

/// The scope report over the two-edge path names affected nodes, a
/// mid-range severity, and core components.
#[test]
fn scope_report_over_propagation_path() {
    let mut graph = CthGraph::new();
    let first = edge(&["service:frontend"], 1000, Severity::Warning);
    let second = edge(
        &["service:frontend", "service:backend"],
        1010,
        Severity::Error,
    );
    graph.add_hyperedge(first.clone()).unwrap();
    graph.add_hyperedge(second.clone()).unwrap();

    let paths = PropagationAnalyzer::default().find_propagation_paths(
        &graph,
        &EntityId::service("frontend"),
        DEFAULT_MAX_PATHS,
    );
    let scope = quantify_propagation_scope(&paths);

    assert!(scope.total_affected_nodes >= 1);
    assert!(matches!(
        scope.scope_severity,
        Severity::Warning | Severity::Error
    ));
    assert!(!scope.core_components.is_empty());
    let component_ids: Vec<_> = scope
        .core_components
        .iter()
        .map(|c| c.edge_id.clone())
        .collect();
    assert!(component_ids.contains(&first.edge_id) || component_ids.contains(&second.edge_id));
}

#[test]
fn empty_graph_statistics_are_zero() {
    let graph = CthGraph::new();
    let stats = graph.statistics();
    assert_eq!(stats.total_edges, 0);
    assert_eq!(stats.total_nodes, 0);
    assert_eq!(stats.time_span_seconds, 0.0);
    assert!(stats.earliest_event.is_none());

    let mut populated = CthGraph::new();
    populated
        .add_hyperedge(edge(&["service:a"], 100, Severity::Error))
        .unwrap();
    populated.clear();
    assert_eq!(populated.statistics().total_edges, 0);
}

#[test]
fn snapshot_round_trip_preserves_graph() {
    let mut graph = CthGraph::new();
    graph
        .add_hyperedge(
            edge(&["service:a", "pod:p1"], 100, Severity::Error)
                .with_metrics(["a:cpu".to_string()].into_iter().collect())
                .with_trace_id("t-1"),
        )
        .unwrap();
    graph
        .add_hyperedge(edge(&["pod:p1", "node:n1"], 200, Severity::Critical))
        .unwrap();

    let json = serde_json::to_string(&graph.to_snapshot()).unwrap();
    let restored = CthGraph::from_snapshot(serde_json::from_str(&json).unwrap()).unwrap();

    assert_eq!(restored.len(), graph.len());
    for (orig, back) in graph.iter_time_ordered().zip(restored.iter_time_ordered()) {
        assert_eq!(orig.edge_id, back.edge_id);
        assert_eq!(orig.nodes, back.nodes);
        assert_eq!(orig.severity, back.severity);
    }
    restored.verify_integrity().unwrap();
}

/// The full session flow: ingest a document, then exercise every query
/// operation including the no-graph error contract.
#[test]
fn session_query_contract() {
    let session = DiagnosticSession::default();

    // Before ingestion every query is a structured error.
    let err = session.query(&GraphQuery::GetGraphStatistics).unwrap_err();
    assert!(matches!(err, QueryError::NoGraph));
    assert_eq!(
        serde_json::to_value(&err).unwrap(),
        json!({"error": "No CTH graph available"})
    );

    session
        .ingest(&json!({
            "traces": [{
                "trace_id": "t1",
                "spans": [{
                    "service": "frontend",
                    "start_time": "2024-01-01T10:00:00Z",
                    "status": "error"
                }]
            }],
            "metrics": [],
            "logs": []
        }))
        .unwrap();

    match session
        .query(&GraphQuery::QueryNodesByEntity {
            entity: "service:frontend".into(),
        })
        .unwrap()
    {
        QueryResponse::Nodes {
            hyperedges_count, ..
        } => assert_eq!(hyperedges_count, 1),
        other => panic!("unexpected response: {other:?}"),
    }

    match session
        .query(&GraphQuery::QueryAnomalousEvents { severity: None })
        .unwrap()
    {
        QueryResponse::AnomalousEvents {
            anomalous_events_count,
            ..
        } => assert_eq!(anomalous_events_count, 1),
        other => panic!("unexpected response: {other:?}"),
    }

    // Empty result sets are successes, not errors.
    match session
        .query(&GraphQuery::QueryAnomalousEvents {
            severity: Some(Severity::Critical),
        })
        .unwrap()
    {
        QueryResponse::AnomalousEvents {
            anomalous_events_count,
            events,
        } => {
            assert_eq!(anomalous_events_count, 0);
            assert!(events.is_empty());
        }
        other => panic!("unexpected response: {other:?}"),
    }

    match session
        .query(&GraphQuery::FindPropagationPaths {
            start_node: "service:frontend".into(),
            max_paths: Some(3),
        })
        .unwrap()
    {
        QueryResponse::PropagationPaths { paths_found, .. } => assert!(paths_found >= 1),
        other => panic!("unexpected response: {other:?}"),
    }

    match session.query(&GraphQuery::GetGraphStatistics).unwrap() {
        QueryResponse::Statistics(stats) => assert_eq!(stats.total_edges, 1),
        other => panic!("unexpected response: {other:?}"),
    }
}

/// Orphaned anomaly signals become their own bucketed edges, and both edge
/// kinds participate in the same graph.
#[test]
fn mixed_trace_and_orphan_ingestion() {
    let graph = build(json!({
        "traces": [{
            "trace_id": "t1",
            "spans": [{
                "service": "frontend",
                "start_time": "2024-01-01T10:00:00Z",
                "status": "error"
            }]
        }],
        "metrics": [{
            "entity": "db-service",
            "metric_name": "connections",
            "timestamp": "2024-01-01T10:20:00Z",
            "is_anomalous": true
        }],
        "logs": []
    }));

    assert_eq!(graph.len(), 2);
    let kinds: Vec<EventType> = graph.iter_time_ordered().map(|e| e.event_type).collect();
    assert_eq!(kinds, vec![EventType::TraceEvent, EventType::OrphanedAnomaly]);
}
