//! Lead Submission Pipeline.
//!
//! Builds the payload from the session and the confirming request, formats
//! and validates it, and posts it to the marketplace exactly once. A success
//! is persisted here; a failure is returned with its record so the engine can
//! move the session to FAILED_SUBMISSION. Nothing is retried automatically.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::domain::category::CatalogError;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::lead::{LeadPayload, SubmissionContext};
use crate::domain::schema::SchemaViolations;
use crate::domain::session::{Session, SessionStage, SessionUpdate, SubmissionRecord};
use crate::ports::{
    LeadMarketplace, LeadSubmission, MarketplaceError, MarketplaceResponse, SessionStore,
    SessionStoreError,
};

use super::catalog::CategoryCatalog;
use super::schema_registry::SchemaRegistry;

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("session has no category")]
    NoCategory,

    #[error("category '{0}' is not configured")]
    UnknownCategory(String),

    #[error("category '{0}' has no marketplace routing")]
    MissingRouting(String),

    #[error("lead payload is invalid: {0}")]
    Invalid(SchemaViolations),

    #[error("marketplace rejected the lead: {0}")]
    Rejected(String),

    #[error(transparent)]
    Marketplace(#[from] MarketplaceError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Store(#[from] SessionStoreError),

    #[error("session disappeared during submission")]
    SessionLost,
}

impl SubmissionError {
    /// Errors that no amount of user retrying can fix.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SubmissionError::NoCategory
                | SubmissionError::UnknownCategory(_)
                | SubmissionError::MissingRouting(_)
                | SubmissionError::Catalog(_)
        )
    }
}

impl From<SubmissionError> for DomainError {
    fn from(err: SubmissionError) -> Self {
        let code = match &err {
            SubmissionError::Invalid(_) => ErrorCode::ValidationFailed,
            SubmissionError::Rejected(_) | SubmissionError::Marketplace(_) => {
                ErrorCode::MarketplaceError
            }
            SubmissionError::Store(_) | SubmissionError::SessionLost => ErrorCode::DatabaseError,
            _ => ErrorCode::ConfigurationError,
        };
        DomainError::new(code, err.to_string())
    }
}

/// Result of one submission attempt that reached a verdict.
#[derive(Debug)]
pub enum SubmissionOutcome {
    /// Accepted; the returned session is already SUBMITTED.
    Submitted { session: Session, lead_id: String },
    /// Invalid payload, rejection or transport failure.
    Failed {
        error: SubmissionError,
        record: SubmissionRecord,
    },
}

pub struct LeadSubmissionService {
    store: Arc<dyn SessionStore>,
    marketplace: Arc<dyn LeadMarketplace>,
    catalog: Arc<CategoryCatalog>,
    schemas: Arc<SchemaRegistry>,
    timeout: Duration,
}

impl LeadSubmissionService {
    pub fn new(
        store: Arc<dyn SessionStore>,
        marketplace: Arc<dyn LeadMarketplace>,
        catalog: Arc<CategoryCatalog>,
        schemas: Arc<SchemaRegistry>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            marketplace,
            catalog,
            schemas,
            timeout,
        }
    }

    /// Submits `session`, which must be READY_TO_SUBMIT and hold the claim.
    ///
    /// `Err` is reserved for configuration and store failures; every
    /// user-recoverable failure is a [`SubmissionOutcome::Failed`].
    pub async fn submit(
        &self,
        session: &Session,
        context: &SubmissionContext,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        let key = session.category().ok_or(SubmissionError::NoCategory)?;
        let category = self
            .catalog
            .get_category(key)
            .await?
            .ok_or_else(|| SubmissionError::UnknownCategory(key.to_string()))?;
        let routing = category
            .marketplace
            .clone()
            .ok_or_else(|| SubmissionError::MissingRouting(key.to_string()))?;

        let payload = LeadPayload::assemble(&category, session.answers(), context).formatted(&category);
        let fields = match self.schemas.validate_submission(key, payload.fields()).await? {
            Some(Ok(fields)) => fields,
            Some(Err(violations)) => {
                tracing::warn!(
                    session_id = %session.id(),
                    category = key,
                    fields = ?violations.fields().collect::<Vec<_>>(),
                    "Lead payload failed validation, not submitting"
                );
                let record = SubmissionRecord {
                    status: Some("invalid".to_string()),
                    message: Some(violations.to_string()),
                    ..SubmissionRecord::new()
                };
                return Ok(SubmissionOutcome::Failed {
                    error: SubmissionError::Invalid(violations),
                    record,
                });
            }
            None => return Err(SubmissionError::UnknownCategory(key.to_string())),
        };

        let lead = LeadSubmission {
            routing,
            category: key.to_string(),
            sub_category: session.sub_category().map(str::to_string),
            payload: LeadPayload::from(fields),
        };

        tracing::info!(session_id = %session.id(), category = key, "Submitting lead to marketplace");
        let result = match tokio::time::timeout(self.timeout, self.marketplace.submit(&lead)).await {
            Ok(result) => result,
            Err(_) => Err(MarketplaceError::Timeout),
        };

        match result {
            Ok(response) if response.accepted && response.lead_id.is_some() => {
                self.record_success(session, response).await
            }
            Ok(response) => {
                let message = response
                    .message
                    .clone()
                    .unwrap_or_else(|| "lead was not accepted".to_string());
                tracing::warn!(
                    session_id = %session.id(),
                    code = ?response.code,
                    status = ?response.status,
                    "Marketplace rejected lead"
                );
                Ok(SubmissionOutcome::Failed {
                    record: record_from(response),
                    error: SubmissionError::Rejected(message),
                })
            }
            Err(err) => {
                tracing::error!(session_id = %session.id(), error = %err, "Marketplace submission failed");
                let record = SubmissionRecord {
                    status: Some("error".to_string()),
                    response_code: match &err {
                        MarketplaceError::Http { status, .. } => Some(i64::from(*status)),
                        _ => None,
                    },
                    message: Some(err.to_string()),
                    raw_response: match &err {
                        MarketplaceError::Http { body, .. } => Some(json!(body)),
                        _ => None,
                    },
                    ..SubmissionRecord::new()
                };
                Ok(SubmissionOutcome::Failed {
                    error: SubmissionError::Marketplace(err),
                    record,
                })
            }
        }
    }

    async fn record_success(
        &self,
        session: &Session,
        response: MarketplaceResponse,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        let lead_id = response.lead_id.clone().unwrap_or_default();
        let update = SessionUpdate::new()
            .expect_stage(SessionStage::ReadyToSubmit)
            .with_stage(SessionStage::Submitted)
            .with_submission(record_from(response))
            .release_claim()
            .awaiting(None);

        let updated = self
            .store
            .update(session.id(), update)
            .await?
            .ok_or(SubmissionError::SessionLost)?;

        tracing::info!(session_id = %session.id(), lead_id = %lead_id, "Lead accepted by marketplace");
        Ok(SubmissionOutcome::Submitted {
            session: updated,
            lead_id,
        })
    }
}

fn record_from(response: MarketplaceResponse) -> SubmissionRecord {
    SubmissionRecord {
        lead_id: response.lead_id,
        status: response.status,
        response_code: response.code,
        message: response.message,
        raw_response: response.raw,
        ..SubmissionRecord::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::catalog::InMemoryCategorySource;
    use crate::adapters::marketplace::MockMarketplace;
    use crate::adapters::storage::InMemorySessionStore;
    use crate::domain::session::ClientContext;
    use std::collections::BTreeMap;

    const DOC: &str = r#"
categories:
  family_law:
    name: Family Law
    keywords: [divorce]
    fields:
      first_name: { type: text, required: true, source: user_provided }
      phone: { type: phone, required: true, source: user_provided, format: dashed }
      lead_source: { type: text, required: true, source: static_config, value: chat_widget }
      ip_address: { type: text, source: server_derived }
      trusted_form_cert_url: { type: text, source: tracking_id }
    marketplace: { campaign_id: FL-1, supplier_id: SUP, key: KEY }
"#;

    struct Fixture {
        store: Arc<InMemorySessionStore>,
        marketplace: Arc<MockMarketplace>,
        service: LeadSubmissionService,
    }

    fn fixture(marketplace: MockMarketplace) -> Fixture {
        let store = Arc::new(InMemorySessionStore::default());
        let marketplace = Arc::new(marketplace);
        let source = InMemoryCategorySource::from_yaml(DOC).unwrap();
        let catalog = Arc::new(CategoryCatalog::new(Arc::new(source), Duration::from_secs(300)));
        let schemas = Arc::new(SchemaRegistry::new(catalog.clone()));
        let service = LeadSubmissionService::new(
            store.clone(),
            marketplace.clone(),
            catalog,
            schemas,
            Duration::from_secs(1),
        );
        Fixture {
            store,
            marketplace,
            service,
        }
    }

    async fn ready_session(store: &InMemorySessionStore, category: &str, phone: &str) -> Session {
        let session = store.create(ClientContext::default()).await.unwrap();
        store
            .update(
                session.id(),
                SessionUpdate::new()
                    .with_category(category, None)
                    .with_answer("first_name", "Jane")
                    .with_answer("phone", phone)
                    .with_stage(SessionStage::ReadyToSubmit),
            )
            .await
            .unwrap();
        store
            .update(session.id(), SessionUpdate::new().acquire_claim())
            .await
            .unwrap()
            .unwrap()
    }

    fn context() -> SubmissionContext {
        let client = ClientContext {
            ip_address: Some("203.0.113.9".to_string()),
            ..ClientContext::default()
        };
        let mut tracking = BTreeMap::new();
        tracking.insert("trusted_form_cert_url".to_string(), "https://cert/abc".to_string());
        SubmissionContext::new(client, tracking)
    }

    #[tokio::test]
    async fn accepted_lead_moves_session_to_submitted() {
        let fx = fixture(MockMarketplace::new());
        let session = ready_session(&fx.store, "family_law", "5551234567").await;

        let outcome = fx.service.submit(&session, &context()).await.unwrap();

        let SubmissionOutcome::Submitted { session, lead_id } = outcome else {
            panic!("expected submission to succeed");
        };
        assert_eq!(lead_id, "MOCK-1");
        assert_eq!(session.stage(), SessionStage::Submitted);
        assert_eq!(session.lead_id(), Some("MOCK-1"));
        assert!(!session.has_live_claim());

        let sent = fx.marketplace.submissions();
        assert_eq!(sent.len(), 1);
        let payload = &sent[0].payload;
        assert_eq!(payload.get("phone"), Some("555-123-4567"));
        assert_eq!(payload.get("lead_source"), Some("chat_widget"));
        assert_eq!(payload.get("ip_address"), Some("203.0.113.9"));
        assert_eq!(payload.get("trusted_form_cert_url"), Some("https://cert/abc"));
        assert_eq!(sent[0].routing.campaign_id, "FL-1");
    }

    #[tokio::test]
    async fn rejection_is_a_failed_outcome_with_record() {
        let fx = fixture(MockMarketplace::rejecting("duplicate lead"));
        let session = ready_session(&fx.store, "family_law", "5551234567").await;

        let outcome = fx.service.submit(&session, &context()).await.unwrap();

        let SubmissionOutcome::Failed { error, record } = outcome else {
            panic!("expected failure");
        };
        assert!(matches!(error, SubmissionError::Rejected(ref m) if m == "duplicate lead"));
        assert_eq!(record.message.as_deref(), Some("duplicate lead"));

        let stored = fx.store.get(session.id()).await.unwrap().unwrap();
        assert_eq!(stored.stage(), SessionStage::ReadyToSubmit);
    }

    #[tokio::test]
    async fn transport_failure_keeps_status_code() {
        let fx = fixture(MockMarketplace::failing(MarketplaceError::Http {
            status: 502,
            body: "bad gateway".to_string(),
        }));
        let session = ready_session(&fx.store, "family_law", "5551234567").await;

        let outcome = fx.service.submit(&session, &context()).await.unwrap();

        let SubmissionOutcome::Failed { record, .. } = outcome else {
            panic!("expected failure");
        };
        assert_eq!(record.response_code, Some(502));
        assert_eq!(record.raw_response, Some(json!("bad gateway")));
    }

    #[tokio::test]
    async fn slow_marketplace_times_out() {
        let fx = fixture(MockMarketplace::new().with_delay(Duration::from_secs(5)));
        let session = ready_session(&fx.store, "family_law", "5551234567").await;

        let outcome = fx.service.submit(&session, &context()).await.unwrap();

        assert!(matches!(
            outcome,
            SubmissionOutcome::Failed {
                error: SubmissionError::Marketplace(MarketplaceError::Timeout),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn invalid_payload_never_reaches_marketplace() {
        let fx = fixture(MockMarketplace::new());
        let session = ready_session(&fx.store, "family_law", "555").await;

        let outcome = fx.service.submit(&session, &context()).await.unwrap();

        let SubmissionOutcome::Failed { error, .. } = outcome else {
            panic!("expected failure");
        };
        let SubmissionError::Invalid(violations) = error else {
            panic!("expected validation failure");
        };
        assert_eq!(violations.fields().collect::<Vec<_>>(), vec!["phone"]);
        assert_eq!(fx.marketplace.submission_count(), 0);
    }

    #[tokio::test]
    async fn unknown_category_is_a_configuration_error() {
        let fx = fixture(MockMarketplace::new());
        let session = ready_session(&fx.store, "tax_law", "5551234567").await;

        let err = fx.service.submit(&session, &context()).await.unwrap_err();

        assert!(matches!(err, SubmissionError::UnknownCategory(ref k) if k == "tax_law"));
        assert!(err.is_configuration());
        assert_eq!(fx.marketplace.submission_count(), 0);
    }
}
