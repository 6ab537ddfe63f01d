use crate::path::PropagationPath;
use crate::scoring::{HeuristicScorer, TransitionScorer};
use cth_graph::CthGraph;
use cth_types::{EdgeId, EntityId, Hyperedge};
use std::cmp::Ordering;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use tracing::debug;

/// Default cap on the number of returned paths.
pub const DEFAULT_MAX_PATHS: usize = 5;

#[derive(Clone, Copy, Debug)]
pub struct AnalyzerConfig {
    /// Longest path, in hyperedges, the search will follow.
    pub max_path_length: usize,
    /// Cumulative probability below which a branch is abandoned.
    pub min_probability: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_path_length: 10,
            min_probability: 0.1,
        }
    }
}

/// Bounded breadth-first search for likely fault propagation paths.
///
/// Seeds are the hyperedges containing the anomalous start node, explored
/// earliest-first. A branch extends through the graph's adjacency rule as
/// long as its cumulative probability (product of transition scores) stays
/// at or above `min_probability`; paths are recorded at dead ends and at
/// the length cap. Results are merged across seeds, ranked by probability
/// with a deterministic tie-break, and truncated.
pub struct PropagationAnalyzer {
    config: AnalyzerConfig,
    scorer: Box<dyn TransitionScorer>,
}

impl Default for PropagationAnalyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

struct SearchState<'g> {
    edge: &'g Hyperedge,
    path: Vec<&'g Hyperedge>,
    probability: f64,
    visited: HashSet<EdgeId>,
}

impl PropagationAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self::with_scorer(config, Box::new(HeuristicScorer))
    }

    pub fn with_scorer(config: AnalyzerConfig, scorer: Box<dyn TransitionScorer>) -> Self {
        Self { config, scorer }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Most likely propagation paths starting from `start`, at most
    /// `max_paths` of them, best first.
    pub fn find_propagation_paths(
        &self,
        graph: &CthGraph,
        start: &EntityId,
        max_paths: usize,
    ) -> Vec<PropagationPath> {
        self.search(graph, start, max_paths, None)
    }

    /// Like [`Self::find_propagation_paths`], but polls `cancel` between BFS
    /// expansions. When the flag is raised the search stops and returns the
    /// paths completed so far.
    pub fn find_propagation_paths_cancellable(
        &self,
        graph: &CthGraph,
        start: &EntityId,
        max_paths: usize,
        cancel: &AtomicBool,
    ) -> Vec<PropagationPath> {
        self.search(graph, start, max_paths, Some(cancel))
    }

    fn search(
        &self,
        graph: &CthGraph,
        start: &EntityId,
        max_paths: usize,
        cancel: Option<&AtomicBool>,
    ) -> Vec<PropagationPath> {
        let mut seeds = graph.get_hyperedges_containing(start);
        if seeds.is_empty() {
            debug!(node = %start, "no hyperedges contain the start node");
            return Vec::new();
        }
        seeds.sort_by_key(|e| e.timestamp);

        let mut all_paths = Vec::new();
        for seed in seeds {
            if cancelled(cancel) {
                debug!(node = %start, "path search cancelled");
                break;
            }
            self.bfs_from(graph, seed, cancel, &mut all_paths);
        }

        all_paths.sort_by(compare_paths);
        all_paths.truncate(max_paths);
        all_paths
    }

    fn bfs_from<'g>(
        &self,
        graph: &'g CthGraph,
        seed: &'g Hyperedge,
        cancel: Option<&AtomicBool>,
        out: &mut Vec<PropagationPath>,
    ) {
        let mut queue = VecDeque::new();
        queue.push_back(SearchState {
            edge: seed,
            path: vec![seed],
            probability: 1.0,
            visited: HashSet::from([seed.edge_id.clone()]),
        });

        while let Some(state) = queue.pop_front() {
            if cancelled(cancel) {
                return;
            }

            if state.path.len() >= self.config.max_path_length {
                self.record(state, out);
                continue;
            }

            let next = graph.find_next_hyperedges(state.edge, &state.visited);
            if next.is_empty() {
                self.record(state, out);
                continue;
            }

            let mut ranked: Vec<(&Hyperedge, f64)> = next
                .into_iter()
                .map(|e| (e, self.scorer.score(state.edge, e)))
                .collect();
            ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

            for (next_edge, transition) in ranked {
                let probability = state.probability * transition;
                if probability < self.config.min_probability {
                    continue;
                }
                let mut path = state.path.clone();
                path.push(next_edge);
                let mut visited = state.visited.clone();
                visited.insert(next_edge.edge_id.clone());
                queue.push_back(SearchState {
                    edge: next_edge,
                    path,
                    probability,
                    visited,
                });
            }
        }
    }

    fn record(&self, state: SearchState<'_>, out: &mut Vec<PropagationPath>) {
        if state.probability >= self.config.min_probability {
            out.push(PropagationPath::new(
                state.path.into_iter().cloned().collect(),
                state.probability,
            ));
        }
    }
}

/// Ranking: probability descending, then shorter paths, then earlier start.
/// The secondary keys make the ordering total and reproducible.
fn compare_paths(a: &PropagationPath, b: &PropagationPath) -> Ordering {
    b.probability
        .partial_cmp(&a.probability)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.len().cmp(&b.len()))
        .then_with(|| a.start_time().cmp(&b.start_time()))
}

fn cancelled(cancel: Option<&AtomicBool>) -> bool {
    cancel.is_some_and(|flag| flag.load(AtomicOrdering::Relaxed))
}
