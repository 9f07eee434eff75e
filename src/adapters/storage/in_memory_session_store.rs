//! In-Memory Session Store Adapter
//!
//! Keeps sessions in a process-local map. Every mutation happens under the
//! write lock, so read-modify-write is atomic per store. Useful for tests,
//! development and single-instance deployments.

use async_trait::async_trait;
use chrono::Duration;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::SessionId;
use crate::domain::session::{ClientContext, Session, SessionUpdate, Turn};
use crate::ports::{SessionStore, SessionStoreError};

/// In-memory storage for intake sessions.
#[derive(Debug, Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
    ttl: Duration,
}

impl InMemorySessionStore {
    /// Create a store whose sessions expire `ttl` after their last mutation.
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Clear all stored sessions (useful for tests).
    pub async fn clear(&self) {
        self.sessions.write().await.clear();
    }

    /// Number of stored sessions, expired ones included.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(Duration::days(7))
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, client: ClientContext) -> Result<Session, SessionStoreError> {
        let session = Session::new(client, self.ttl);
        self.sessions
            .write()
            .await
            .insert(*session.id(), session.clone());
        Ok(session)
    }

    async fn get(&self, id: &SessionId) -> Result<Option<Session>, SessionStoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(id).filter(|s| !s.is_expired()).cloned())
    }

    async fn update(
        &self,
        id: &SessionId,
        update: SessionUpdate,
    ) -> Result<Option<Session>, SessionStoreError> {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(id).filter(|s| !s.is_expired()) else {
            return Ok(None);
        };
        session.apply(update, self.ttl)?;
        Ok(Some(session.clone()))
    }

    async fn delete(&self, id: &SessionId) -> Result<bool, SessionStoreError> {
        Ok(self.sessions.write().await.remove(id).is_some())
    }

    async fn append_transcript(
        &self,
        id: &SessionId,
        turn: Turn,
    ) -> Result<bool, SessionStoreError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(id).filter(|s| !s.is_expired()) {
            Some(session) => {
                session.append_turn(turn, self.ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn clear_transcript(&self, id: &SessionId) -> Result<bool, SessionStoreError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(id).filter(|s| !s.is_expired()) {
            Some(session) => {
                session.clear_transcript(self.ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn purge_expired(&self) -> Result<u64, SessionStoreError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired());
        Ok((before - sessions.len()) as u64)
    }
}
