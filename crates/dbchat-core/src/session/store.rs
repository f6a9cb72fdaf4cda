//! Session store - id-keyed registry of live chat sessions
//!
//! Multi-conversation callers (a server embedding the library, a CLI with
//! tabs) create sessions here and address them by id. The store hands out
//! each session behind its own mutex so concurrent turns on different
//! sessions proceed independently while turns on the same session are
//! serialized.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

use super::chat::ChatSession;

/// Opaque session identifier
pub type SessionId = String;

/// Metadata about a live session
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub id: SessionId,
    pub created_at: DateTime<Utc>,
}

struct Entry {
    session: Arc<Mutex<ChatSession>>,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, Entry>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under a fresh id
    pub async fn create(&self, session: ChatSession) -> SessionId {
        let id = Uuid::new_v4().to_string();
        let entry = Entry {
            session: Arc::new(Mutex::new(session)),
            created_at: Utc::now(),
        };
        self.sessions.write().await.insert(id.clone(), entry);
        info!(session_id = %id, "Session created");
        id
    }

    /// Look up a session by id
    pub async fn get(&self, id: &str) -> Option<Arc<Mutex<ChatSession>>> {
        self.sessions
            .read()
            .await
            .get(id)
            .map(|entry| entry.session.clone())
    }

    /// Drop a session, releasing its provider connections
    ///
    /// Returns false when no session with that id exists.
    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            info!(session_id = %id, "Session removed");
        }
        removed
    }

    /// Metadata for all live sessions
    pub async fn list(&self) -> Vec<SessionInfo> {
        self.sessions
            .read()
            .await
            .iter()
            .map(|(id, entry)| SessionInfo {
                id: id.clone(),
                created_at: entry.created_at,
            })
            .collect()
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
