#![deny(unsafe_code)]
//! # cth-analysis
//!
//! Fault propagation analysis over a [`cth_graph::CthGraph`].
//!
//! ## Key Types
//!
//! - [`TransitionScorer`] / [`HeuristicScorer`]: pluggable model for the
//!   probability that one hyperedge caused the next.
//! - [`PropagationAnalyzer`]: bounded BFS over the graph's adjacency rule,
//!   producing ranked [`PropagationPath`]s.
//! - [`ScopeAnalysis`]: blast-radius quantification over a set of paths.
//! - [`PropagationReport`]: the full diagnostic artifact: paths, scope,
//!   graph statistics, and actionable recommendations.
//!
//! Analysis is read-only and deterministic for a given graph and scorer.
//! Long searches can be cancelled cooperatively through an `AtomicBool`
//! polled between BFS expansions.

pub mod analyzer;
pub mod path;
pub mod report;
pub mod scope;
pub mod scoring;

pub use analyzer::{AnalyzerConfig, PropagationAnalyzer, DEFAULT_MAX_PATHS};
pub use path::{PathSummary, PropagationPath};
pub use report::{PathReport, PropagationReport};
pub use scope::{quantify_propagation_scope, CoreComponent, ScopeAnalysis, TemporalSpread};
pub use scoring::{HeuristicScorer, TransitionScorer};
