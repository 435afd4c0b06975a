//! MCP Session Store
//!
//! Maps opaque session ids to their activity timestamps. Sessions gate
//! nothing; they let one client's calls be correlated. A lookup miss (unknown
//! or already swept id) simply mints a new session.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub created_at: Instant,
    pub last_activity: Instant,
}

/// Session id chosen for one exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSession {
    pub id: String,
    pub is_new: bool,
}

#[derive(Debug)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    timeout: Duration,
}

impl SessionStore {
    pub fn new(timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// Reuse the presented session or register a fresh one
    pub async fn resolve(&self, presented: Option<&str>) -> ResolvedSession {
        self.resolve_at(presented, Instant::now()).await
    }

    pub async fn resolve_at(&self, presented: Option<&str>, now: Instant) -> ResolvedSession {
        let mut sessions = self.sessions.lock().await;

        if let Some(id) = presented {
            if let Some(session) = sessions.get_mut(id) {
                session.last_activity = now;
                return ResolvedSession {
                    id: id.to_string(),
                    is_new: false,
                };
            }
        }

        let id = Uuid::new_v4().to_string();
        sessions.insert(
            id.clone(),
            Session {
                created_at: now,
                last_activity: now,
            },
        );
        ResolvedSession { id, is_new: true }
    }

    /// Remove sessions idle longer than the timeout; returns how many went
    pub async fn sweep(&self) -> usize {
        self.sweep_at(Instant::now()).await
    }

    pub async fn sweep_at(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| now.saturating_duration_since(session.last_activity) <= self.timeout);
        before - sessions.len()
    }

    pub async fn get(&self, id: &str) -> Option<Session> {
        self.sessions.lock().await.get(id).copied()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.sessions.lock().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    pub async fn clear(&self) {
        self.sessions.lock().await.clear();
    }
}
