use cth_types::{EntityKind, Hyperedge};
use std::collections::BTreeSet;

/// Decay constant for the time-proximity factor, in seconds.
const TIME_DECAY_SECS: f64 = 300.0;

/// Model for the probability that `from` caused `to`.
///
/// Scores are in `[0.0, 1.0]` and must be `0.0` whenever `to` does not
/// start strictly after `from`. The heuristic implementation below can be
/// swapped for a learned model without touching the path search.
pub trait TransitionScorer: Send + Sync {
    fn score(&self, from: &Hyperedge, to: &Hyperedge) -> f64;
}

/// Rule-based transition scoring over four weighted factors:
///
/// - time proximity, exponential decay with a 5-minute constant (0.3)
/// - node overlap, Jaccard similarity of the node sets (0.4)
/// - severity escalation, rewarding `to` at least as severe as `from` (0.2)
/// - entity-kind relationship, from a fixed affinity table (0.1)
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicScorer;

impl TransitionScorer for HeuristicScorer {
    fn score(&self, from: &Hyperedge, to: &Hyperedge) -> f64 {
        let delta_secs = (to.timestamp - from.timestamp).num_milliseconds() as f64 / 1000.0;
        if delta_secs <= 0.0 {
            return 0.0;
        }

        let time_factor = (-delta_secs / TIME_DECAY_SECS).exp();
        let overlap = from.intersection_count(to) as f64 / from.union_count(to) as f64;

        let w_from = from.severity.weight() as f64;
        let w_to = to.severity.weight() as f64;
        let severity_factor = if w_to >= w_from {
            1.0 + (w_to - w_from) * 0.2
        } else {
            0.8
        };

        let entity_factor = entity_relationship_factor(&from.nodes, &to.nodes);

        let score =
            time_factor * 0.3 + overlap * 0.4 + severity_factor * 0.2 + entity_factor * 0.1;
        score.min(1.0)
    }
}

/// Strongest known affinity between any kind in `from` and any kind in `to`,
/// checked in both orientations. Kinds with no table entry contribute zero.
fn entity_relationship_factor(
    from: &BTreeSet<cth_types::EntityId>,
    to: &BTreeSet<cth_types::EntityId>,
) -> f64 {
    let kinds_from: BTreeSet<EntityKind> = from.iter().map(|n| n.kind).collect();
    let kinds_to: BTreeSet<EntityKind> = to.iter().map(|n| n.kind).collect();

    let mut factor: f64 = 0.0;
    for a in &kinds_from {
        for b in &kinds_to {
            if let Some(strength) = relationship_strength(*a, *b).or(relationship_strength(*b, *a))
            {
                factor = factor.max(strength);
            }
        }
    }
    factor
}

fn relationship_strength(a: EntityKind, b: EntityKind) -> Option<f64> {
    use EntityKind::*;
    match (a, b) {
        (Service, Pod) => Some(0.9),
        (Pod, Node) => Some(0.8),
        (Service, Service) => Some(0.7),
        (Pod, Pod) => Some(0.6),
        (Container, Pod) => Some(0.9),
        (Service, Container) => Some(0.8),
        _ => None,
    }
}
