/// Errors from parsing the CTH vocabulary out of text.
///
/// These are record-level: a caller that hits one drops the offending value
/// from consideration, it never aborts a whole ingestion batch.
#[derive(Debug, thiserror::Error)]
pub enum TypeParseError {
    #[error("unknown severity: {0:?} (expected normal|warning|error|critical)")]
    UnknownSeverity(String),
    #[error("empty entity identifier")]
    EmptyEntity,
    #[error("invalid edge id hex: {0}")]
    InvalidEdgeIdHex(String),
    #[error("hyperedge must contain at least one entity")]
    EmptyNodeSet,
}
