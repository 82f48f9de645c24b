use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::session::Session;

/// Key-value seam over session storage, injected into the orchestrator so
/// a durable or expiring backend can replace the in-memory map without
/// touching state-machine logic.
///
/// Each session is handed out behind its own mutex: a turn holds the lock
/// from load to reply, so two requests for the same key serialize while
/// distinct sessions proceed in parallel.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the session for this key, creating it on first sight.
    async fn get_or_create(&self, session_id: &str) -> Arc<Mutex<Session>>;

    /// Inserts a pre-seeded session (used by reset).
    async fn insert(&self, session: Session);

    async fn len(&self) -> usize;

    /// Drops sessions idle longer than `ttl`; returns how many went.
    async fn evict_idle(&self, ttl: Duration) -> usize;
}

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, Arc<Mutex<Session>>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_or_create(&self, session_id: &str) -> Arc<Mutex<Session>> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Session::new(session_id))))
            .clone()
    }

    async fn insert(&self, session: Session) {
        let mut sessions = self.sessions.lock().await;
        sessions.insert(session.id.clone(), Arc::new(Mutex::new(session)));
    }

    async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    async fn evict_idle(&self, ttl: Duration) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();

        let mut keep = HashMap::with_capacity(before);
        for (id, handle) in sessions.drain() {
            let idle = match handle.try_lock() {
                Ok(session) => session.last_activity.elapsed(),
                // A locked session is mid-turn, so it is not idle.
                Err(_) => Duration::ZERO,
            };
            if idle < ttl {
                keep.insert(id, handle);
            }
        }

        *sessions = keep;
        before - sessions.len()
    }
}
