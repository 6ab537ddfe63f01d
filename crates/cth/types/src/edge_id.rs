use crate::entity::EntityId;
use crate::error::TypeParseError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Content-addressed hyperedge identifier (BLAKE3, 32 bytes).
///
/// `edge_id = blake3(sorted canonical nodes || rfc3339 timestamp)`. The
/// full-width hash makes a collision between distinct events negligible, so
/// an id clash on insert means the same node-set-plus-timestamp was
/// re-ingested.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId([u8; 32]);

impl EdgeId {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Derive the id from a hyperedge's node set and start timestamp.
    ///
    /// `BTreeSet` iteration is already sorted, which keeps the derivation
    /// independent of the order nodes were discovered in.
    pub fn derive(nodes: &BTreeSet<EntityId>, timestamp: &DateTime<Utc>) -> Self {
        let mut hasher = blake3::Hasher::new();
        for node in nodes {
            hasher.update(node.canonical().as_bytes());
            hasher.update(b"\n");
        }
        hasher.update(
            timestamp
                .to_rfc3339_opts(SecondsFormat::Micros, true)
                .as_bytes(),
        );
        Self(*hasher.finalize().as_bytes())
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    pub fn from_hex(hex: &str) -> Result<Self, TypeParseError> {
        if hex.len() != 64 {
            return Err(TypeParseError::InvalidEdgeIdHex(hex.to_string()));
        }
        let mut bytes = [0u8; 32];
        for (i, chunk) in bytes.iter_mut().enumerate() {
            *chunk = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|_| TypeParseError::InvalidEdgeIdHex(hex.to_string()))?;
        }
        Ok(Self(bytes))
    }
}

impl fmt::Debug for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeId({})", &self.to_hex()[..12])
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..12])
    }
}

impl Serialize for EdgeId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for EdgeId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        EdgeId::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}
