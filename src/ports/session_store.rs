//! Session store port.
//!
//! Defines the contract for the durable, TTL-expiring record of one intake
//! conversation.
//!
//! # Design
//!
//! - **Read-modify-write inside the store**: `update` applies a
//!   [`SessionUpdate`] to the freshest stored record, never to a snapshot the
//!   caller held across an AI call
//! - **Sliding TTL**: every successful mutation pushes `expires_at` forward
//! - **Conditional updates**: an update carrying an expected stage or a claim
//!   is rejected with [`SessionError`] instead of being applied

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, SessionId};
use crate::domain::session::{ClientContext, Session, SessionError, SessionUpdate, Turn};

/// Session store failures.
#[derive(Debug, Clone, Error)]
pub enum SessionStoreError {
    /// The backing store could not be reached. Fatal for the request.
    #[error("session store unavailable: {0}")]
    Unavailable(String),

    /// A stored record could not be decoded.
    #[error("stored session {id} is corrupt: {message}")]
    Corrupt { id: SessionId, message: String },

    /// A conditional update was refused.
    #[error(transparent)]
    Rejected(#[from] SessionError),
}

impl SessionStoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// The rejection, if this is a refused conditional update.
    pub fn rejection(&self) -> Option<&SessionError> {
        match self {
            SessionStoreError::Rejected(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SessionStoreError> for DomainError {
    fn from(err: SessionStoreError) -> Self {
        match err {
            SessionStoreError::Rejected(rejection) => rejection.into(),
            other => DomainError::new(ErrorCode::DatabaseError, other.to_string()),
        }
    }
}

/// Port for session persistence.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Allocates a new session in `COLLECTING`.
    async fn create(&self, client: ClientContext) -> Result<Session, SessionStoreError>;

    /// Returns `None` for unknown or expired ids.
    async fn get(&self, id: &SessionId) -> Result<Option<Session>, SessionStoreError>;

    /// Applies `update` to the stored record and returns the result.
    ///
    /// Returns `Ok(None)` if the session does not exist; callers treat this
    /// as "session lost".
    ///
    /// # Errors
    ///
    /// - `Rejected` if an expected stage or claim guard fails
    /// - `Unavailable` on backend failure
    async fn update(
        &self,
        id: &SessionId,
        update: SessionUpdate,
    ) -> Result<Option<Session>, SessionStoreError>;

    /// Deletes a session. Returns whether it existed.
    async fn delete(&self, id: &SessionId) -> Result<bool, SessionStoreError>;

    /// Appends a turn. Returns false if the session does not exist.
    async fn append_transcript(&self, id: &SessionId, turn: Turn)
        -> Result<bool, SessionStoreError>;

    /// Removes every turn. Returns false if the session does not exist.
    async fn clear_transcript(&self, id: &SessionId) -> Result<bool, SessionStoreError>;

    /// Deletes every expired session; returns how many were removed.
    async fn purge_expired(&self) -> Result<u64, SessionStoreError>;
}
