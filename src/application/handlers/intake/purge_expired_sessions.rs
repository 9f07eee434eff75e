//! PurgeExpiredSessionsHandler - store maintenance.

use std::sync::Arc;

use crate::ports::{SessionStore, SessionStoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeExpiredSessionsResult {
    pub purged: u64,
}

pub struct PurgeExpiredSessionsHandler {
    store: Arc<dyn SessionStore>,
}

impl PurgeExpiredSessionsHandler {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self) -> Result<PurgeExpiredSessionsResult, SessionStoreError> {
        let purged = self.store.purge_expired().await?;
        if purged > 0 {
            tracing::info!(purged, "Purged expired sessions");
        } else {
            tracing::debug!("No expired sessions to purge");
        }
        Ok(PurgeExpiredSessionsResult { purged })
    }
}
