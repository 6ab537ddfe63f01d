use cth_types::EdgeId;

/// Errors from hypergraph mutation and restoration.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// An edge with this id is already present. With full-width
    /// content-addressed ids this means the identical node-set-plus-timestamp
    /// was ingested twice; the graph rejects rather than silently overwrite.
    #[error("duplicate hyperedge: {0}")]
    DuplicateEdge(EdgeId),
    /// An index or ordering invariant does not hold. This is a defect in
    /// the code that built the graph, never a recoverable runtime condition.
    #[error("graph invariant violated: {0}")]
    InvariantViolation(String),
}
