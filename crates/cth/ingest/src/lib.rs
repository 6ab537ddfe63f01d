#![deny(unsafe_code)]
//! # cth-ingest
//!
//! Turns raw observability documents (traces, metrics, logs) into
//! hyperedges and accumulates them in a [`cth_graph::CthGraph`].
//!
//! Ingestion is two-phase:
//!
//! 1. [`validate_document`] performs a structural check on the raw JSON and
//!    returns *every* violation found, never just the first, so a caller
//!    can report all problems in one pass.
//! 2. [`CthBuilder::build`] converts a parsed [`TelemetryBatch`] into a
//!    graph. Individual malformed records (unparseable timestamps, missing
//!    entities) are dropped from correlation with a `tracing` event; they
//!    never fail the batch.
//!
//! The CTH is sparse by design: a trace only produces a hyperedge when it
//! carries an anomaly signal (anomalous metric, critical log, or errored
//! span). Anomalous signals not covered by any trace are grouped into
//! 5-minute buckets and emitted as `orphaned_anomaly` edges.

pub mod builder;
pub mod input;
pub mod validate;

pub use builder::{BuilderConfig, CthBuilder, CRITICAL_KEYWORDS};
pub use input::{LogRecord, MetricRecord, SpanRecord, TelemetryBatch, TraceRecord};
pub use validate::{validate_document, ValidationIssue};
