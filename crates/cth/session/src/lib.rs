#![deny(unsafe_code)]
//! # cth-session
//!
//! Diagnostic session management for the CTH engine: each session owns at
//! most one graph, built from the most recent ingestion, and answers
//! structured queries against it.
//!
//! ## Key Types
//!
//! - [`DiagnosticSession`]: one graph behind an `RwLock`, with its builder
//!   and analyzer. Ingestion validates, parses, builds, and atomically
//!   replaces the graph.
//! - [`GraphQuery`] / [`QueryResponse`]: the closed query surface. Unknown
//!   operations are unrepresentable; empty results are successes.
//! - [`SessionManager`]: concurrent session store with capacity and idle
//!   expiry, cleaned up on demand rather than by a background thread.

pub mod error;
pub mod manager;
pub mod query;
pub mod session;

pub use error::{IngestError, QueryError, SessionError};
pub use manager::{SessionId, SessionInfo, SessionManager, SessionManagerConfig};
pub use query::{GraphQuery, QueryResponse};
pub use session::DiagnosticSession;
