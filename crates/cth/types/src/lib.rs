#![deny(unsafe_code)]
//! # cth-types
//!
//! Core vocabulary for the Causal-Temporal Hypergraph (CTH): the data unit
//! that every other crate in this workspace builds on.
//!
//! A hyperedge `h = (N, M, L, T)` records one joint event in a distributed
//! system:
//!
//! - `N`: the set of entities (services, pods, containers, nodes) that
//!   participated in the event,
//! - `M`: the anomalous metrics observed during the event,
//! - `L`: the critical log excerpts observed during the event,
//! - `T`: the event start time.
//!
//! Every hyperedge is content-addressed: `edge_id = blake3(sorted nodes ||
//! timestamp)`. Two hyperedges with the same node set and timestamp are the
//! same event by definition; everything else gets a distinct full-width id.
//!
//! ## Key Types
//!
//! - [`Hyperedge`]: an immutable-once-created record of one joint event
//! - [`EntityId`] / [`EntityKind`]: `<type>:<name>` entity identifiers
//! - [`Severity`]: totally ordered `normal < warning < error < critical`
//! - [`EdgeId`]: BLAKE3 content-addressed hyperedge identifier

pub mod edge_id;
pub mod entity;
pub mod error;
pub mod hyperedge;
pub mod severity;

pub use edge_id::EdgeId;
pub use entity::{EntityId, EntityKind};
pub use error::TypeParseError;
pub use hyperedge::{EventType, Hyperedge};
pub use severity::Severity;
