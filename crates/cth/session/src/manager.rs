use crate::error::SessionError;
use crate::session::DiagnosticSession;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Unique identifier for a diagnostic session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn generate() -> Self {
        Self(format!("session-{}", uuid::Uuid::new_v4()))
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SessionManagerConfig {
    /// Maximum concurrent sessions.
    pub max_sessions: usize,
    /// Sessions idle longer than this are eligible for eviction.
    pub idle_timeout_mins: i64,
}

impl Default for SessionManagerConfig {
    fn default() -> Self {
        Self {
            max_sessions: 1000,
            idle_timeout_mins: 60,
        }
    }
}

/// Snapshot of one session's state, for listings and health endpoints.
#[derive(Clone, Debug, Serialize)]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    pub has_graph: bool,
    pub total_edges: Option<usize>,
}

/// Concurrent store of diagnostic sessions, one graph per session.
///
/// Expired sessions are evicted on demand: when the store is full and on
/// explicit [`Self::cleanup_expired`] calls. There is no background thread;
/// the embedding layer decides when to sweep.
pub struct SessionManager {
    sessions: RwLock<HashMap<SessionId, Arc<DiagnosticSession>>>,
    config: SessionManagerConfig,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(SessionManagerConfig::default())
    }
}

impl SessionManager {
    pub fn new(config: SessionManagerConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
        }
    }

    fn idle_timeout(&self) -> Duration {
        Duration::minutes(self.config.idle_timeout_mins)
    }

    /// Fetch the session with `id`, creating it if absent. Access counts as
    /// activity for expiry purposes.
    pub fn get_or_create(&self, id: &SessionId) -> Result<Arc<DiagnosticSession>, SessionError> {
        let mut sessions = self.sessions.write().map_err(|_| SessionError::Lock)?;

        if let Some(session) = sessions.get(id) {
            session.touch();
            return Ok(Arc::clone(session));
        }

        if sessions.len() >= self.config.max_sessions {
            let timeout = self.idle_timeout();
            sessions.retain(|_, s| !s.is_expired(timeout));
            if sessions.len() >= self.config.max_sessions {
                return Err(SessionError::TooManySessions);
            }
        }

        info!(session = %id, "creating diagnostic session");
        let session = Arc::new(DiagnosticSession::default());
        sessions.insert(id.clone(), Arc::clone(&session));
        Ok(session)
    }

    /// Fetch an existing session without creating one.
    pub fn get(&self, id: &SessionId) -> Result<Arc<DiagnosticSession>, SessionError> {
        let sessions = self.sessions.read().map_err(|_| SessionError::Lock)?;
        let session = sessions
            .get(id)
            .ok_or_else(|| SessionError::SessionNotFound(id.0.clone()))?;
        session.touch();
        Ok(Arc::clone(session))
    }

    /// Drop a session. Returns whether it existed.
    pub fn remove(&self, id: &SessionId) -> Result<bool, SessionError> {
        let mut sessions = self.sessions.write().map_err(|_| SessionError::Lock)?;
        Ok(sessions.remove(id).is_some())
    }

    /// Evict every expired session, returning how many were dropped.
    pub fn cleanup_expired(&self) -> Result<usize, SessionError> {
        let mut sessions = self.sessions.write().map_err(|_| SessionError::Lock)?;
        let before = sessions.len();
        let timeout = self.idle_timeout();
        sessions.retain(|_, s| !s.is_expired(timeout));
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!(evicted, "expired sessions removed");
        }
        Ok(evicted)
    }

    pub fn session_count(&self) -> Result<usize, SessionError> {
        let sessions = self.sessions.read().map_err(|_| SessionError::Lock)?;
        Ok(sessions.len())
    }

    pub fn session_info(&self, id: &SessionId) -> Result<SessionInfo, SessionError> {
        let sessions = self.sessions.read().map_err(|_| SessionError::Lock)?;
        let session = sessions
            .get(id)
            .ok_or_else(|| SessionError::SessionNotFound(id.0.clone()))?;
        Ok(SessionInfo {
            session_id: id.clone(),
            created_at: session.created_at(),
            last_active_at: session.last_active_at(),
            has_graph: session.has_graph(),
            total_edges: session.graph_len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_or_create_roundtrip() {
        let manager = SessionManager::default();
        let id = SessionId::generate();

        let first = manager.get_or_create(&id).unwrap();
        let second = manager.get_or_create(&id).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(manager.session_count().unwrap(), 1);
    }

    #[test]
    fn get_missing_session_fails() {
        let manager = SessionManager::default();
        let err = manager.get(&SessionId::new("nope")).unwrap_err();
        assert!(matches!(err, SessionError::SessionNotFound(_)));
    }

    #[test]
    fn sessions_are_isolated() {
        let manager = SessionManager::default();
        let a = manager.get_or_create(&SessionId::new("a")).unwrap();
        let b = manager.get_or_create(&SessionId::new("b")).unwrap();

        a.ingest(&json!({
            "traces": [{
                "trace_id": "t1",
                "spans": [{
                    "service": "frontend",
                    "start_time": "2024-01-01T10:00:00Z",
                    "status": "error"
                }]
            }],
            "metrics": [],
            "logs": []
        }))
        .unwrap();

        assert!(a.has_graph());
        assert!(!b.has_graph());
    }

    #[test]
    fn remove_session() {
        let manager = SessionManager::default();
        let id = SessionId::new("gone");
        manager.get_or_create(&id).unwrap();
        assert!(manager.remove(&id).unwrap());
        assert!(!manager.remove(&id).unwrap());
        assert_eq!(manager.session_count().unwrap(), 0);
    }

    #[test]
    fn capacity_enforced_after_cleanup_attempt() {
        let manager = SessionManager::new(SessionManagerConfig {
            max_sessions: 2,
            idle_timeout_mins: 60,
        });
        manager.get_or_create(&SessionId::new("a")).unwrap();
        manager.get_or_create(&SessionId::new("b")).unwrap();
        // Neither session is idle, so the third is refused.
        let err = manager.get_or_create(&SessionId::new("c")).unwrap_err();
        assert!(matches!(err, SessionError::TooManySessions));
        // Existing sessions are still reachable at capacity.
        assert!(manager.get_or_create(&SessionId::new("a")).is_ok());
    }

    #[test]
    fn cleanup_with_no_expired_sessions_is_noop() {
        let manager = SessionManager::default();
        manager.get_or_create(&SessionId::new("a")).unwrap();
        assert_eq!(manager.cleanup_expired().unwrap(), 0);
        assert_eq!(manager.session_count().unwrap(), 1);
    }

    #[test]
    fn session_info_reflects_state() {
        let manager = SessionManager::default();
        let id = SessionId::new("info");
        manager.get_or_create(&id).unwrap();

        let info = manager.session_info(&id).unwrap();
        assert_eq!(info.session_id, id);
        assert!(!info.has_graph);
        assert!(info.total_edges.is_none());
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }
}
