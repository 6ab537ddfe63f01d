use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of entity a hyperedge node refers to.
///
/// The `Entity` variant is the fallback for identifiers whose type could not
/// be inferred (orphaned anomalies report bare entity names).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Service,
    Pod,
    Container,
    Node,
    Entity,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Service => "service",
            Self::Pod => "pod",
            Self::Container => "container",
            Self::Node => "node",
            Self::Entity => "entity",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "service" => Some(Self::Service),
            "pod" => Some(Self::Pod),
            "container" => Some(Self::Container),
            "node" => Some(Self::Node),
            "entity" => Some(Self::Entity),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A typed entity identifier with canonical text form `<type>:<name>`.
///
/// Parsing is total: an identifier without a recognized `<type>:` prefix is
/// treated as a bare [`EntityKind::Entity`] name, so free-text lookups
/// never fail outright. Canonicalization is therefore not a round trip for
/// arbitrary strings, only for identifiers this workspace produces.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId {
    pub kind: EntityKind,
    pub name: String,
}

impl EntityId {
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn service(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Service, name)
    }

    pub fn pod(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Pod, name)
    }

    pub fn container(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Container, name)
    }

    pub fn node(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Node, name)
    }

    pub fn entity(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Entity, name)
    }

    /// Canonical `<type>:<name>` form.
    pub fn canonical(&self) -> String {
        format!("{}:{}", self.kind, self.name)
    }

    /// Best-effort textual association used during telemetry correlation:
    /// does the raw entity string from a metric/log record refer to this
    /// node? Substring containment against the canonical form, matching the
    /// heuristic the ingestion contract specifies. Empty needles never match.
    pub fn text_matches(&self, needle: &str) -> bool {
        !needle.is_empty() && self.canonical().contains(needle)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl EntityId {
    /// Parse `<type>:<name>`; identifiers without a recognized prefix become
    /// bare `entity:` names carrying the full input string.
    pub fn parse(s: &str) -> Self {
        if let Some((prefix, rest)) = s.split_once(':') {
            if let Some(kind) = EntityKind::from_prefix(prefix) {
                return Self::new(kind, rest);
            }
        }
        Self::entity(s)
    }
}

impl Serialize for EntityId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(EntityId::parse(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_prefixes() {
        assert_eq!(
            EntityId::parse("service:frontend"),
            EntityId::service("frontend")
        );
        assert_eq!(EntityId::parse("pod:web-7f9"), EntityId::pod("web-7f9"));
        assert_eq!(EntityId::parse("node:ip-10-0-0-1"), EntityId::node("ip-10-0-0-1"));
    }

    #[test]
    fn parse_unknown_prefix_falls_back_to_entity() {
        let id = EntityId::parse("frontend");
        assert_eq!(id.kind, EntityKind::Entity);
        assert_eq!(id.name, "frontend");
    }

    #[test]
    fn canonical_roundtrip_for_produced_ids() {
        let id = EntityId::container("app-1");
        assert_eq!(EntityId::parse(&id.canonical()), id);
    }

    #[test]
    fn text_matching_substring() {
        let id = EntityId::service("frontend");
        assert!(id.text_matches("frontend"));
        assert!(id.text_matches("service:frontend"));
        assert!(id.text_matches("front"));
        assert!(!id.text_matches("backend"));
        assert!(!id.text_matches(""));
    }

    #[test]
    fn serde_as_canonical_string() {
        let id = EntityId::pod("web-7f9");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"pod:web-7f9\"");
        let back: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn ordering_is_stable() {
        let mut ids = vec![
            EntityId::service("b"),
            EntityId::pod("a"),
            EntityId::service("a"),
        ];
        ids.sort();
        assert_eq!(ids[0], EntityId::service("a"));
        assert_eq!(ids[1], EntityId::service("b"));
    }
}
