//! ResetSessionHandler - clears the transcript and deletes the session.

use std::sync::Arc;

use crate::domain::foundation::SessionId;
use crate::ports::{SessionStore, SessionStoreError};

#[derive(Debug, Clone)]
pub struct ResetSessionCommand {
    pub session_id: SessionId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetSessionResult {
    /// False when there was no such session.
    pub reset: bool,
}

pub struct ResetSessionHandler {
    store: Arc<dyn SessionStore>,
}

impl ResetSessionHandler {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        cmd: ResetSessionCommand,
    ) -> Result<ResetSessionResult, SessionStoreError> {
        self.store.clear_transcript(&cmd.session_id).await?;
        let reset = self.store.delete(&cmd.session_id).await?;
        tracing::info!(session_id = %cmd.session_id, reset, "Session reset");
        Ok(ResetSessionResult { reset })
    }
}
