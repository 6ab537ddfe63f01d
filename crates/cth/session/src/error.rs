use cth_ingest::ValidationIssue;
use serde::ser::SerializeMap;
use serde::Serialize;
use thiserror::Error;

/// Session store failures.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session lock poisoned")]
    Lock,
    #[error("session not found: {0}")]
    SessionNotFound(String),
    #[error("session limit reached")]
    TooManySessions,
}

/// Ingestion failures. Record-level problems inside a structurally valid
/// document never surface here; they are skipped during the build.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The document failed the structural check. Carries every issue found.
    #[error("input validation failed ({} issues)", .issues.len())]
    Validation { issues: Vec<ValidationIssue> },
    #[error("malformed document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Query failures, serialized as `{"error": "..."}` so callers can always
/// distinguish a failed query from an empty result.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("No CTH graph available")]
    NoGraph,
    #[error("session lock poisoned")]
    Lock,
}

impl Serialize for QueryError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("error", &self.to_string())?;
        map.end()
    }
}
