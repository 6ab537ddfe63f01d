#![deny(unsafe_code)]
//! # cth-graph
//!
//! Storage and indexing for the Causal-Temporal Hypergraph.
//!
//! [`CthGraph`] accumulates hyperedges and maintains two derived indices:
//!
//! - `node_to_edges`: inverted index from entity to the edges containing it,
//! - `time_ordered`: edge ids sorted ascending by timestamp (stable: equal
//!   timestamps keep insertion order).
//!
//! The propagation graph is never materialized. Adjacency between
//! hyperedges is a pure predicate (strictly later in time, node sets
//! intersect) recomputed on every [`CthGraph::find_next_hyperedges`] call.
//!
//! A graph instance is exclusively owned by one diagnostic session. The
//! struct itself is synchronous and not internally locked; callers that
//! share an instance across threads must wrap it (single writer, multiple
//! readers); `cth-session` does exactly that with an `RwLock`.

pub mod error;
pub mod graph;
pub mod stats;

pub use error::GraphError;
pub use graph::{CthGraph, GraphSnapshot};
pub use stats::{GraphMetadata, GraphStatistics};
