//! SendMessageHandler - the conversation engine.
//!
//! Each inbound message is one independent pass: read the session, compute,
//! and write changes back as conditional [`SessionUpdate`]s. Nothing is held
//! across requests. A conditional update that loses a race is answered with
//! the session's current status instead of an error.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::json;

use super::IntakeError;
use crate::application::catalog::CategoryCatalog;
use crate::application::detector::CategoryDetector;
use crate::application::extractor::{ExtractionRequest, FieldExtractor};
use crate::application::fallback::Strategy;
use crate::application::schema_registry::SchemaRegistry;
use crate::application::submission::{LeadSubmissionService, SubmissionError, SubmissionOutcome};
use crate::domain::category::{CategoryConfig, CategoryConfigSet, Detection};
use crate::domain::conversation::{
    classify, clarifying_prompt, field_prompt, replies, summary_prompt, Intent,
};
use crate::domain::foundation::SessionId;
use crate::domain::lead::SubmissionContext;
use crate::domain::session::{
    ClientContext, Session, SessionError, SessionStage, SessionUpdate, Turn,
};
use crate::ports::{SessionStore, SessionStoreError};

/// Longest accepted user message, in characters.
pub const MAX_MESSAGE_LENGTH: usize = 4_000;

#[derive(Debug, Clone, Default)]
pub struct SendMessageCommand {
    /// Absent or unknown ids start a new session.
    pub session_id: Option<SessionId>,
    pub message: String,
    pub client: ClientContext,
    /// Opaque consent and tracking identifiers for the lead payload.
    pub tracking: BTreeMap<String, String>,
}

impl SendMessageCommand {
    pub fn new(session_id: Option<SessionId>, message: impl Into<String>) -> Self {
        Self {
            session_id,
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_client(mut self, client: ClientContext) -> Self {
        self.client = client;
        self
    }

    pub fn with_tracking(mut self, tracking: BTreeMap<String, String>) -> Self {
        self.tracking = tracking;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageResult {
    pub reply: String,
    pub session_id: SessionId,
    /// True once the lead has been accepted.
    pub complete: bool,
    pub stage: SessionStage,
}

/// What happened during one turn, kept on the assistant's transcript entry.
#[derive(Debug, Default)]
struct TurnNotes {
    detection: Option<Strategy>,
    extraction: Option<Strategy>,
    accepted: Vec<String>,
}

type Reply = (String, Session);

pub struct SendMessageHandler {
    store: Arc<dyn SessionStore>,
    catalog: Arc<CategoryCatalog>,
    schemas: Arc<SchemaRegistry>,
    detector: CategoryDetector,
    extractor: FieldExtractor,
    submission: LeadSubmissionService,
}

impl SendMessageHandler {
    pub fn new(
        store: Arc<dyn SessionStore>,
        catalog: Arc<CategoryCatalog>,
        schemas: Arc<SchemaRegistry>,
        detector: CategoryDetector,
        extractor: FieldExtractor,
        submission: LeadSubmissionService,
    ) -> Self {
        Self {
            store,
            catalog,
            schemas,
            detector,
            extractor,
            submission,
        }
    }

    pub async fn handle(&self, cmd: SendMessageCommand) -> Result<SendMessageResult, IntakeError> {
        let message = cmd.message.trim();
        if message.is_empty() {
            return Err(IntakeError::EmptyMessage);
        }
        let length = message.chars().count();
        if length > MAX_MESSAGE_LENGTH {
            return Err(IntakeError::MessageTooLong {
                max: MAX_MESSAGE_LENGTH,
                actual: length,
            });
        }

        let session = self.resolve_session(cmd.session_id, &cmd.client).await?;
        let id = *session.id();
        if !self.store.append_transcript(&id, Turn::user(message)).await? {
            return Err(IntakeError::SessionLost);
        }

        let context = SubmissionContext::new(cmd.client.or(session.client()), cmd.tracking);
        let mut notes = TurnNotes::default();

        let (reply, session) = match session.stage() {
            SessionStage::Collecting => self.collect(session, message, &mut notes).await?,
            SessionStage::ReadyToSubmit => {
                self.review(session, message, &context, &mut notes).await?
            }
            SessionStage::FailedSubmission => self.retry(session, message, &context).await?,
            SessionStage::Submitted => (replies::ALREADY_SUBMITTED.to_string(), session),
        };

        let metadata = json!({
            "stage": session.stage().as_str(),
            "awaiting": session.awaiting_field(),
            "detection": notes.detection.map(|s| s.as_str()),
            "extraction": notes.extraction.map(|s| s.as_str()),
            "accepted_fields": notes.accepted,
        });
        let appended = self
            .store
            .append_transcript(&id, Turn::assistant(reply.as_str()).with_metadata(metadata))
            .await?;
        if !appended {
            tracing::warn!(session_id = %id, "Session removed before reply was recorded");
        }

        tracing::info!(
            session_id = %id,
            stage = session.stage().as_str(),
            category = session.category().unwrap_or("none"),
            "Handled intake message"
        );

        Ok(SendMessageResult {
            reply,
            session_id: id,
            complete: session.stage() == SessionStage::Submitted,
            stage: session.stage(),
        })
    }

    async fn resolve_session(
        &self,
        id: Option<SessionId>,
        client: &ClientContext,
    ) -> Result<Session, IntakeError> {
        if let Some(id) = id {
            match self.store.get(&id).await? {
                Some(session) => return Ok(session),
                None => tracing::info!(session_id = %id, "Unknown session, starting a new one"),
            }
        }
        let session = self.store.create(client.clone()).await?;
        tracing::info!(session_id = %session.id(), "Started intake session");
        Ok(session)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // COLLECTING
    // ─────────────────────────────────────────────────────────────────────────

    async fn collect(
        &self,
        session: Session,
        message: &str,
        notes: &mut TurnNotes,
    ) -> Result<Reply, IntakeError> {
        let set = self.catalog.load().await?;

        let (session, category) = match session.category().and_then(|key| set.get(key)) {
            Some(category) => (session, category),
            None => {
                let resolved = self.detector.detect(*session.id(), message, &set).await;
                notes.detection = Some(resolved.strategy);
                let Detection {
                    category: Some(key),
                    sub_category,
                    ..
                } = resolved.value
                else {
                    return Ok((clarifying_prompt(&set), session));
                };
                let category = set
                    .get(&key)
                    .ok_or_else(|| IntakeError::UnknownCategory(key.clone()))?;
                let update = SessionUpdate::new()
                    .expect_stage(SessionStage::Collecting)
                    .with_category(key, sub_category);
                match self.apply(session.id(), update).await? {
                    Ok(session) => (session, category),
                    Err(conflict) => return self.status_reply(session.id(), conflict).await,
                }
            }
        };

        let targets = collection_targets(category, &session);
        let accepted = self
            .extract_valid(&session, message, category, targets, session.awaiting_field(), notes)
            .await?;

        let mut answers = session.answers().clone();
        answers.extend(accepted.clone());
        let missing = category.missing_required_fields(&answers);

        let update = SessionUpdate::new()
            .expect_stage(SessionStage::Collecting)
            .with_answers(accepted);

        match missing.first() {
            None => {
                let update = update
                    .with_stage(SessionStage::ReadyToSubmit)
                    .awaiting(None);
                match self.apply(session.id(), update).await? {
                    Ok(updated) => {
                        tracing::info!(
                            session_id = %updated.id(),
                            category = %category.key,
                            "All required fields collected"
                        );
                        Ok((summary_prompt(category, updated.answers()), updated))
                    }
                    Err(conflict) => self.status_reply(session.id(), conflict).await,
                }
            }
            Some(next) => {
                let asked_before = session.was_asked(next);
                let update = update.mark_asked(next.clone()).awaiting(Some(next.clone()));
                match self.apply(session.id(), update).await? {
                    Ok(updated) => {
                        let prompt = field_prompt(category, next, updated.answers(), asked_before);
                        Ok((prompt, updated))
                    }
                    Err(conflict) => self.status_reply(session.id(), conflict).await,
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // READY_TO_SUBMIT
    // ─────────────────────────────────────────────────────────────────────────

    async fn review(
        &self,
        session: Session,
        message: &str,
        context: &SubmissionContext,
        notes: &mut TurnNotes,
    ) -> Result<Reply, IntakeError> {
        match classify(message) {
            Intent::Affirm => self.confirm(session, context).await,
            Intent::Decline => Ok((replies::DECLINED.to_string(), session)),
            Intent::Other => self.correct(session, message, notes).await,
        }
    }

    /// Treats the reply as corrections to any user-provided field.
    async fn correct(
        &self,
        session: Session,
        message: &str,
        notes: &mut TurnNotes,
    ) -> Result<Reply, IntakeError> {
        let set = self.catalog.load().await?;
        let category = category_of(&set, &session)?;
        let targets = category.user_fields().map(|(name, _)| name.to_string()).collect();

        let accepted = self
            .extract_valid(&session, message, category, targets, None, notes)
            .await?;
        if accepted.is_empty() {
            let summary = summary_prompt(category, session.answers());
            return Ok((format!("{}\n\n{summary}", replies::NO_CHANGES), session));
        }

        let update = SessionUpdate::new()
            .expect_stage(SessionStage::ReadyToSubmit)
            .with_answers(accepted);
        match self.apply(session.id(), update).await? {
            Ok(updated) => Ok((summary_prompt(category, updated.answers()), updated)),
            Err(conflict) => self.status_reply(session.id(), conflict).await,
        }
    }

    /// Claims the session and submits it. Only the claimant reaches the
    /// marketplace.
    async fn confirm(&self, session: Session, context: &SubmissionContext) -> Result<Reply, IntakeError> {
        let update = SessionUpdate::new()
            .expect_stage(SessionStage::ReadyToSubmit)
            .acquire_claim();
        match self.apply(session.id(), update).await? {
            Ok(claimed) => self.submit_claimed(claimed, context).await,
            Err(SessionError::SubmissionInFlight) => {
                tracing::info!(session_id = %session.id(), "Duplicate confirmation while submission in flight");
                Ok((replies::SUBMISSION_IN_FLIGHT.to_string(), session))
            }
            Err(conflict) => self.status_reply(session.id(), conflict).await,
        }
    }

    async fn submit_claimed(
        &self,
        session: Session,
        context: &SubmissionContext,
    ) -> Result<Reply, IntakeError> {
        match self.submission.submit(&session, context).await {
            Ok(SubmissionOutcome::Submitted { session, .. }) => {
                Ok((replies::SUBMITTED.to_string(), session))
            }
            Ok(SubmissionOutcome::Failed { error, record }) => {
                tracing::warn!(session_id = %session.id(), error = %error, "Submission failed");
                let update = SessionUpdate::new()
                    .expect_stage(SessionStage::ReadyToSubmit)
                    .with_stage(SessionStage::FailedSubmission)
                    .with_submission(record)
                    .release_claim();
                match self.apply(session.id(), update).await? {
                    Ok(failed) => Ok((replies::SUBMISSION_FAILED.to_string(), failed)),
                    Err(conflict) => self.status_reply(session.id(), conflict).await,
                }
            }
            Err(err) => {
                // A store failure may follow an accepted lead, so the claim
                // is left to expire rather than reopening the session.
                if !matches!(err, SubmissionError::Store(_) | SubmissionError::SessionLost) {
                    let release = SessionUpdate::new().release_claim();
                    if let Err(release_err) = self.store.update(session.id(), release).await {
                        tracing::error!(
                            session_id = %session.id(),
                            error = %release_err,
                            "Failed to release submission claim"
                        );
                    }
                }
                tracing::error!(session_id = %session.id(), error = %err, "Submission could not be attempted");
                Err(err.into())
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // FAILED_SUBMISSION
    // ─────────────────────────────────────────────────────────────────────────

    async fn retry(
        &self,
        session: Session,
        message: &str,
        context: &SubmissionContext,
    ) -> Result<Reply, IntakeError> {
        match classify(message) {
            Intent::Affirm => {
                let update = SessionUpdate::new()
                    .expect_stage(SessionStage::FailedSubmission)
                    .with_stage(SessionStage::ReadyToSubmit)
                    .acquire_claim();
                match self.apply(session.id(), update).await? {
                    Ok(claimed) => {
                        tracing::info!(session_id = %session.id(), "Retrying submission");
                        self.submit_claimed(claimed, context).await
                    }
                    Err(SessionError::SubmissionInFlight) => {
                        Ok((replies::SUBMISSION_IN_FLIGHT.to_string(), session))
                    }
                    Err(conflict) => self.status_reply(session.id(), conflict).await,
                }
            }
            Intent::Decline => Ok((replies::DECLINED.to_string(), session)),
            Intent::Other => Ok((replies::RETRY_PROMPT.to_string(), session)),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Applies a conditional update. The inner `Err` is a lost race, not a
    /// failure.
    async fn apply(
        &self,
        id: &SessionId,
        update: SessionUpdate,
    ) -> Result<Result<Session, SessionError>, IntakeError> {
        match self.store.update(id, update).await {
            Ok(Some(session)) => Ok(Ok(session)),
            Ok(None) => Err(IntakeError::SessionLost),
            Err(SessionStoreError::Rejected(rejection)) => Ok(Err(rejection)),
            Err(err) => Err(err.into()),
        }
    }

    /// Re-reads the session after a lost race and describes where it stands.
    async fn status_reply(
        &self,
        id: &SessionId,
        conflict: SessionError,
    ) -> Result<Reply, IntakeError> {
        tracing::info!(session_id = %id, conflict = %conflict, "Concurrent update, replying with current status");
        let session = self.store.get(id).await?.ok_or(IntakeError::SessionLost)?;
        let set = self.catalog.load().await?;
        let category = session.category().and_then(|key| set.get(key));

        let reply = match (session.stage(), category) {
            (SessionStage::Submitted, _) => replies::ALREADY_SUBMITTED.to_string(),
            (SessionStage::FailedSubmission, _) => replies::RETRY_PROMPT.to_string(),
            (SessionStage::ReadyToSubmit, _) if session.has_live_claim() => {
                replies::SUBMISSION_IN_FLIGHT.to_string()
            }
            (SessionStage::ReadyToSubmit, Some(category)) => {
                summary_prompt(category, session.answers())
            }
            (SessionStage::Collecting, Some(category)) => {
                match category.missing_required_fields(session.answers()).first() {
                    Some(next) => field_prompt(category, next, session.answers(), false),
                    None => summary_prompt(category, session.answers()),
                }
            }
            (_, None) => clarifying_prompt(&set),
        };
        Ok((reply, session))
    }

    /// Extracts values for `targets` and keeps the ones the category schema
    /// accepts, normalized.
    async fn extract_valid(
        &self,
        session: &Session,
        message: &str,
        category: &CategoryConfig,
        targets: Vec<String>,
        awaiting: Option<&str>,
        notes: &mut TurnNotes,
    ) -> Result<BTreeMap<String, String>, IntakeError> {
        let request = ExtractionRequest {
            session_id: *session.id(),
            message,
            fields: targets,
            awaiting,
            answers: session.answers(),
        };
        let resolved = self.extractor.extract(request, category).await;
        notes.extraction = Some(resolved.strategy);

        let Some(schema) = self.schemas.schema_for(&category.key).await? else {
            return Err(IntakeError::UnknownCategory(category.key.clone()));
        };

        let mut accepted = BTreeMap::new();
        for (name, value) in resolved.value.fields {
            match schema.validate_field(&name, &value) {
                Ok(valid) => {
                    accepted.insert(name, valid);
                }
                Err(err) => tracing::debug!(
                    session_id = %session.id(),
                    field = %err.field,
                    "Dropped extracted value that failed validation"
                ),
            }
        }
        notes.accepted = accepted.keys().cloned().collect();
        Ok(accepted)
    }
}

/// Fields worth extracting while collecting: the awaited field first, then
/// missing required fields in conversation order, then any other unanswered
/// user-provided field.
fn collection_targets(category: &CategoryConfig, session: &Session) -> Vec<String> {
    let mut targets: Vec<String> = Vec::new();
    if let Some(field) = session.awaiting_field() {
        if category.field(field).is_some_and(|d| d.is_user_provided()) {
            targets.push(field.to_string());
        }
    }
    for field in category.missing_required_fields(session.answers()) {
        if !targets.contains(&field) {
            targets.push(field);
        }
    }
    for (name, _) in category.user_fields() {
        if session.answer(name).is_none() && !targets.iter().any(|t| t == name) {
            targets.push(name.to_string());
        }
    }
    targets
}

fn category_of<'a>(
    set: &'a CategoryConfigSet,
    session: &Session,
) -> Result<&'a CategoryConfig, IntakeError> {
    let key = session
        .category()
        .ok_or(IntakeError::Submission(SubmissionError::NoCategory))?;
    set.get(key)
        .ok_or_else(|| IntakeError::UnknownCategory(key.to_string()))
}
