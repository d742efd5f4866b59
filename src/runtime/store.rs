//! In-memory session store
//!
//! All sessions live in a `HashMap` behind a `RwLock` and are lost on restart.

use super::traits::SessionStore;
use crate::state_machine::{ChatId, Session};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredSession {
    session: Session,
    touched_at: DateTime<Utc>,
}

/// Process-lifetime session store
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<ChatId, StoredSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of active sessions
    #[cfg(test)]
    pub async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Insert with an explicit timestamp (used to simulate idle sessions)
    #[cfg(test)]
    pub async fn set_touched_at(&self, chat_id: ChatId, session: Session, at: DateTime<Utc>) {
        self.sessions.write().await.insert(
            chat_id,
            StoredSession {
                session,
                touched_at: at,
            },
        );
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, chat_id: ChatId) -> Result<Option<Session>, String> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(&chat_id).map(|stored| stored.session.clone()))
    }

    async fn set(&self, chat_id: ChatId, session: Session) -> Result<(), String> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(
            chat_id,
            StoredSession {
                session,
                touched_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn delete(&self, chat_id: ChatId) -> Result<(), String> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(&chat_id);
        Ok(())
    }

    async fn expire_idle(&self, cutoff: DateTime<Utc>) -> Result<Vec<ChatId>, String> {
        let mut sessions = self.sessions.write().await;
        let expired: Vec<ChatId> = sessions
            .iter()
            .filter(|(_, stored)| stored.touched_at < cutoff)
            .map(|(id, _)| *id)
            .collect();
        for id in &expired {
            sessions.remove(id);
        }
        Ok(expired)
    }
}
