//! Mock lead marketplace.
//!
//! Accepts every lead by default, issuing `MOCK-<n>` ids. Used in tests and
//! in development when no marketplace URL is configured.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::ports::{LeadMarketplace, LeadSubmission, MarketplaceError, MarketplaceResponse};

#[derive(Debug, Clone)]
enum Behavior {
    Accept,
    Reject(String),
    Fail(MarketplaceError),
}

#[derive(Debug, Clone)]
pub struct MockMarketplace {
    behavior: Arc<Mutex<Behavior>>,
    delay: Duration,
    counter: Arc<AtomicUsize>,
    submissions: Arc<Mutex<Vec<LeadSubmission>>>,
}

impl Default for MockMarketplace {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMarketplace {
    pub fn new() -> Self {
        Self {
            behavior: Arc::new(Mutex::new(Behavior::Accept)),
            delay: Duration::ZERO,
            counter: Arc::new(AtomicUsize::new(0)),
            submissions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every lead is rejected with `message`.
    pub fn rejecting(message: impl Into<String>) -> Self {
        let mock = Self::new();
        mock.set_rejecting(message);
        mock
    }

    /// Every call fails at the transport level.
    pub fn failing(error: MarketplaceError) -> Self {
        let mock = Self::new();
        mock.set_failing(error);
        mock
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_accepting(&self) {
        *self.lock_behavior() = Behavior::Accept;
    }

    pub fn set_rejecting(&self, message: impl Into<String>) {
        *self.lock_behavior() = Behavior::Reject(message.into());
    }

    pub fn set_failing(&self, error: MarketplaceError) {
        *self.lock_behavior() = Behavior::Fail(error);
    }

    /// Number of submissions received, whatever their outcome.
    pub fn submission_count(&self) -> usize {
        self.lock_submissions().len()
    }

    pub fn submissions(&self) -> Vec<LeadSubmission> {
        self.lock_submissions().clone()
    }

    fn lock_behavior(&self) -> std::sync::MutexGuard<'_, Behavior> {
        self.behavior.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_submissions(&self) -> std::sync::MutexGuard<'_, Vec<LeadSubmission>> {
        self.submissions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl LeadMarketplace for MockMarketplace {
    async fn submit(&self, lead: &LeadSubmission) -> Result<MarketplaceResponse, MarketplaceError> {
        self.lock_submissions().push(lead.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let behavior = self.lock_behavior().clone();
        match behavior {
            Behavior::Accept => {
                let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
                let mut response = MarketplaceResponse::accepted(format!("MOCK-{n}"));
                response.code = Some(200);
                Ok(response)
            }
            Behavior::Reject(message) => Ok(MarketplaceResponse::rejected(message)),
            Behavior::Fail(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::category::MarketplaceRouting;
    use crate::domain::lead::LeadPayload;

    fn lead() -> LeadSubmission {
        LeadSubmission {
            routing: MarketplaceRouting {
                campaign_id: "C".into(),
                supplier_id: "S".into(),
                key: "K".into(),
            },
            category: "family_law".into(),
            sub_category: None,
            payload: LeadPayload::default(),
        }
    }

    #[tokio::test]
    async fn accepts_with_sequential_ids() {
        let mock = MockMarketplace::new();
        let a = mock.submit(&lead()).await.unwrap();
        let b = mock.submit(&lead()).await.unwrap();
        assert_eq!(a.lead_id.as_deref(), Some("MOCK-1"));
        assert_eq!(b.lead_id.as_deref(), Some("MOCK-2"));
        assert_eq!(mock.submission_count(), 2);
    }

    #[tokio::test]
    async fn behavior_can_change_between_calls() {
        let mock = MockMarketplace::failing(MarketplaceError::Timeout);
        assert_eq!(mock.submit(&lead()).await.unwrap_err(), MarketplaceError::Timeout);

        mock.set_rejecting("duplicate");
        assert!(!mock.submit(&lead()).await.unwrap().accepted);

        mock.set_accepting();
        assert!(mock.submit(&lead()).await.unwrap().accepted);
    }
}
