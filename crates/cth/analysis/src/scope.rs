use crate::path::PropagationPath;
use chrono::{DateTime, Utc};
use cth_types::{EdgeId, EntityId, EntityKind, EventType, Hyperedge, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How many top-centrality hyperedges are reported as core components.
const CORE_COMPONENT_LIMIT: usize = 5;

/// Blast-radius quantification over a set of propagation paths.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScopeAnalysis {
    pub total_affected_nodes: usize,
    /// Affected entity names grouped by kind, sorted.
    pub affected_nodes_by_type: BTreeMap<EntityKind, Vec<String>>,
    pub node_type_counts: BTreeMap<EntityKind, usize>,
    /// Top-centrality hyperedges, best first.
    pub core_components: Vec<CoreComponent>,
    pub centrality_scores: BTreeMap<EdgeId, f64>,
    /// `None` when no path has two or more hyperedges.
    pub temporal_analysis: Option<TemporalSpread>,
    pub scope_severity: Severity,
    /// Mean nodes affected per second across multi-edge paths.
    pub propagation_velocity: f64,
}

/// One hyperedge that plays a central role across the path set.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CoreComponent {
    pub edge_id: EdgeId,
    pub centrality_score: f64,
    pub nodes: Vec<EntityId>,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
}

/// Temporal characteristics of the propagation, over multi-edge paths only.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TemporalSpread {
    pub earliest_event: DateTime<Utc>,
    pub latest_event: DateTime<Utc>,
    pub total_time_span_seconds: f64,
    pub average_path_duration_secs: f64,
    pub max_path_duration_secs: f64,
    pub min_path_duration_secs: f64,
}

/// Quantify the scope and impact of fault propagation across `paths`.
/// An empty path set yields the zero analysis.
pub fn quantify_propagation_scope(paths: &[PropagationPath]) -> ScopeAnalysis {
    if paths.is_empty() {
        return ScopeAnalysis::default();
    }

    let mut by_type: BTreeMap<EntityKind, Vec<String>> = BTreeMap::new();
    let all_nodes: std::collections::BTreeSet<&EntityId> =
        paths.iter().flat_map(|p| p.total_nodes.iter()).collect();
    // all_nodes is sorted by (kind, name), so per-kind vectors come out
    // sorted too.
    for node in &all_nodes {
        by_type.entry(node.kind).or_default().push(node.name.clone());
    }
    let counts: BTreeMap<EntityKind, usize> =
        by_type.iter().map(|(k, v)| (*k, v.len())).collect();

    let centrality_scores = hyperedge_centrality(paths);
    let core_components = core_components(paths, &centrality_scores);
    let temporal_analysis = temporal_spread(paths);

    ScopeAnalysis {
        total_affected_nodes: all_nodes.len(),
        affected_nodes_by_type: by_type,
        node_type_counts: counts,
        core_components,
        centrality_scores,
        temporal_analysis,
        scope_severity: scope_severity(paths),
        propagation_velocity: propagation_velocity(paths),
    }
}

/// Centrality per hyperedge: 0.7 x how many paths it appears in (as a
/// fraction), plus 0.3 x how medial its average position is (peaking at
/// the middle of a path).
fn hyperedge_centrality(paths: &[PropagationPath]) -> BTreeMap<EdgeId, f64> {
    let mut frequency: BTreeMap<EdgeId, usize> = BTreeMap::new();
    let mut positions: BTreeMap<EdgeId, Vec<f64>> = BTreeMap::new();

    for path in paths {
        let len = path.len();
        for (i, edge) in path.hyperedges.iter().enumerate() {
            *frequency.entry(edge.edge_id.clone()).or_default() += 1;
            positions
                .entry(edge.edge_id.clone())
                .or_default()
                .push(i as f64 / len as f64);
        }
    }

    let total_paths = paths.len() as f64;
    frequency
        .into_iter()
        .map(|(id, freq)| {
            let pos = &positions[&id];
            let avg_position = pos.iter().sum::<f64>() / pos.len() as f64;
            let frequency_score = freq as f64 / total_paths;
            let position_score = 1.0 - (avg_position - 0.5).abs() * 2.0;
            (id, frequency_score * 0.7 + position_score * 0.3)
        })
        .collect()
}

fn core_components(
    paths: &[PropagationPath],
    centrality: &BTreeMap<EdgeId, f64>,
) -> Vec<CoreComponent> {
    let mut ranked: Vec<(&EdgeId, f64)> = centrality.iter().map(|(id, s)| (id, *s)).collect();
    // Tie-break on the id so the ranking is reproducible.
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    ranked.truncate(CORE_COMPONENT_LIMIT);

    ranked
        .into_iter()
        .filter_map(|(id, score)| {
            let edge = find_edge(paths, id)?;
            Some(CoreComponent {
                edge_id: id.clone(),
                centrality_score: score,
                nodes: edge.nodes.iter().cloned().collect(),
                severity: edge.severity,
                timestamp: edge.timestamp,
                event_type: edge.event_type,
            })
        })
        .collect()
}

fn find_edge<'p>(paths: &'p [PropagationPath], id: &EdgeId) -> Option<&'p Hyperedge> {
    paths
        .iter()
        .flat_map(|p| p.hyperedges.iter())
        .find(|e| &e.edge_id == id)
}

fn temporal_spread(paths: &[PropagationPath]) -> Option<TemporalSpread> {
    let mut timestamps: Vec<DateTime<Utc>> = Vec::new();
    let mut durations: Vec<f64> = Vec::new();

    for path in paths {
        if path.len() >= 2 {
            if let Some(d) = path.duration_secs() {
                durations.push(d);
            }
            timestamps.extend(path.hyperedges.iter().map(|e| e.timestamp));
        }
    }

    let earliest = *timestamps.iter().min()?;
    let latest = *timestamps.iter().max()?;
    let avg = durations.iter().sum::<f64>() / durations.len() as f64;
    Some(TemporalSpread {
        earliest_event: earliest,
        latest_event: latest,
        total_time_span_seconds: (latest - earliest).num_milliseconds() as f64 / 1000.0,
        average_path_duration_secs: avg,
        max_path_duration_secs: durations.iter().cloned().fold(f64::MIN, f64::max),
        min_path_duration_secs: durations.iter().cloned().fold(f64::MAX, f64::min),
    })
}

/// Probability-weighted average severity weight across every hyperedge in
/// every path, bucketed back into a severity. High-probability paths count
/// for more.
fn scope_severity(paths: &[PropagationPath]) -> Severity {
    let mut total_weight = 0.0;
    let mut total_mass = 0.0;
    for path in paths {
        for edge in &path.hyperedges {
            total_weight += edge.severity.weight() as f64 * path.probability;
            total_mass += path.probability;
        }
    }
    if total_mass == 0.0 {
        return Severity::Normal;
    }
    Severity::from_average_weight(total_weight / total_mass)
}

/// Mean of nodes-per-second over multi-edge paths with positive duration.
fn propagation_velocity(paths: &[PropagationPath]) -> f64 {
    let velocities: Vec<f64> = paths
        .iter()
        .filter(|p| p.len() >= 2)
        .filter_map(|p| {
            let duration = p.duration_secs()?;
            (duration > 0.0).then(|| p.total_nodes.len() as f64 / duration)
        })
        .collect();
    if velocities.is_empty() {
        return 0.0;
    }
    velocities.iter().sum::<f64>() / velocities.len() as f64
}
