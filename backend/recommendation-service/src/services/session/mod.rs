use chrono::{Duration, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::models::Session;

/// Shared session state, keyed by session id. Reads hand out clones; the
/// dialogue manager is the single writer for any one session and persists
/// its changes with `put`. Implementations must be safe under concurrent
/// access from different session ids.
pub trait SessionStore: Send + Sync {
    fn get_or_create(&self, session_id: &str, user_id: &str) -> Session;
    fn get(&self, session_id: &str) -> Option<Session>;
    fn put(&self, session: Session);
    fn delete(&self, session_id: &str);
    /// Remove sessions idle past the TTL; returns how many were evicted.
    fn sweep_expired(&self) -> usize;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local store with TTL-based eviction. A generous TTL (minutes,
/// not seconds) is the guard against racing an in-flight turn: a session
/// being processed always has a fresh `last_activity`.
pub struct InMemorySessionStore {
    sessions: DashMap<String, Session>,
    ttl: Duration,
}

impl InMemorySessionStore {
    pub fn new(ttl_minutes: i64) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl: Duration::minutes(ttl_minutes),
        }
    }
}

impl SessionStore for InMemorySessionStore {
    fn get_or_create(&self, session_id: &str, user_id: &str) -> Session {
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Session::new(session_id, user_id))
            .value()
            .clone()
    }

    fn get(&self, session_id: &str) -> Option<Session> {
        self.sessions.get(session_id).map(|s| s.value().clone())
    }

    fn put(&self, session: Session) {
        self.sessions.insert(session.session_id.clone(), session);
    }

    fn delete(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }

    fn sweep_expired(&self) -> usize {
        let cutoff = Utc::now() - self.ttl;
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.last_activity >= cutoff);
        let evicted = before - self.sessions.len();
        if evicted > 0 {
            debug!(evicted, remaining = self.sessions.len(), "session sweep");
        }
        evicted
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }
}
