//! Session aggregate entity.
//!
//! A session is the accumulated state of one intake conversation and the
//! single source of truth for the engine. It is read at the start of every
//! turn and mutated only through [`SessionUpdate`]s applied by the store, so
//! every write is a read-modify-write against the latest record.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::{SessionError, SessionStage, SessionUpdate};
use crate::domain::foundation::{SessionId, StateMachine, Timestamp};

/// How long a submission claim blocks other confirmations.
pub const SUBMISSION_CLAIM_TTL_SECS: i64 = 120;

/// Request-derived attributes of the visitor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

impl ClientContext {
    /// Looks up a request attribute by its configuration name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        match name {
            "ip_address" | "ip" => self.ip_address.as_deref(),
            "user_agent" => self.user_agent.as_deref(),
            "referrer" | "referer" | "landing_page" => self.referrer.as_deref(),
            _ => None,
        }
    }

    /// Fills any attribute missing here from `other`.
    pub fn or(self, other: &ClientContext) -> ClientContext {
        ClientContext {
            ip_address: self.ip_address.or_else(|| other.ip_address.clone()),
            user_agent: self.user_agent.or_else(|| other.user_agent.clone()),
            referrer: self.referrer.or_else(|| other.referrer.clone()),
        }
    }
}

/// Who produced a transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One entry of the append-only transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
    pub timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Turn {
    pub fn new(role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Timestamp::now(),
            metadata: None,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(TurnRole::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, text)
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Outcome of the most recent marketplace submission attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub lead_id: Option<String>,
    pub status: Option<String>,
    pub response_code: Option<i64>,
    pub message: Option<String>,
    pub raw_response: Option<serde_json::Value>,
    pub attempted_at: Timestamp,
    /// Set by the session when the record is applied.
    #[serde(default)]
    pub attempts: u32,
}

impl SubmissionRecord {
    pub fn new() -> Self {
        Self {
            lead_id: None,
            status: None,
            response_code: None,
            message: None,
            raw_response: None,
            attempted_at: Timestamp::now(),
            attempts: 0,
        }
    }
}

impl Default for SubmissionRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Session aggregate - one intake conversation.
///
/// # Invariants
///
/// - `stage` only moves along [`SessionStage`]'s state machine
/// - `answers` holds at most one value per field name
/// - `transcript` is only ever appended to or cleared as a whole
/// - every mutation refreshes `updated_at` and slides `expires_at`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    created_at: Timestamp,
    updated_at: Timestamp,
    expires_at: Timestamp,
    client: ClientContext,
    category: Option<String>,
    sub_category: Option<String>,
    stage: SessionStage,
    answers: BTreeMap<String, String>,
    asked: BTreeSet<String>,
    awaiting_field: Option<String>,
    transcript: Vec<Turn>,
    submission: Option<SubmissionRecord>,
    submission_claimed_at: Option<Timestamp>,
}

impl Session {
    /// Creates a fresh session in `COLLECTING` that expires after `ttl`.
    pub fn new(client: ClientContext, ttl: Duration) -> Self {
        let now = Timestamp::now();
        Self {
            id: SessionId::new(),
            created_at: now,
            updated_at: now,
            expires_at: now.plus(ttl),
            client,
            category: None,
            sub_category: None,
            stage: SessionStage::Collecting,
            answers: BTreeMap::new(),
            asked: BTreeSet::new(),
            awaiting_field: None,
            transcript: Vec::new(),
            submission: None,
            submission_claimed_at: None,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    pub fn expires_at(&self) -> &Timestamp {
        &self.expires_at
    }

    pub fn client(&self) -> &ClientContext {
        &self.client
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn sub_category(&self) -> Option<&str> {
        self.sub_category.as_deref()
    }

    pub fn stage(&self) -> SessionStage {
        self.stage
    }

    pub fn answers(&self) -> &BTreeMap<String, String> {
        &self.answers
    }

    pub fn answer(&self, field: &str) -> Option<&str> {
        self.answers.get(field).map(String::as_str)
    }

    pub fn asked(&self) -> &BTreeSet<String> {
        &self.asked
    }

    pub fn was_asked(&self, field: &str) -> bool {
        self.asked.contains(field)
    }

    /// The field the most recent prompt asked for.
    pub fn awaiting_field(&self) -> Option<&str> {
        self.awaiting_field.as_deref()
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn submission(&self) -> Option<&SubmissionRecord> {
        self.submission.as_ref()
    }

    /// External lead id, present once the marketplace accepted the lead.
    pub fn lead_id(&self) -> Option<&str> {
        self.submission.as_ref().and_then(|s| s.lead_id.as_deref())
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.has_passed()
    }

    /// True while another request holds the submission claim.
    pub fn has_live_claim(&self) -> bool {
        self.submission_claimed_at
            .map(|at| !at.plus(Duration::seconds(SUBMISSION_CLAIM_TTL_SECS)).has_passed())
            .unwrap_or(false)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Applies a partial update.
    ///
    /// All guards are checked before anything is written, so a rejected
    /// update leaves the session untouched.
    ///
    /// # Errors
    ///
    /// - `StageConflict` if the update expected a different stage
    /// - `SubmissionInFlight` if it tries to claim a claimed session
    /// - `InvalidTransition` if the stage edge is illegal
    pub fn apply(&mut self, update: SessionUpdate, ttl: Duration) -> Result<(), SessionError> {
        if let Some(expected) = update.expected_stage {
            if self.stage != expected {
                return Err(SessionError::StageConflict {
                    expected,
                    actual: self.stage,
                });
            }
        }

        if update.acquire_claim && self.has_live_claim() {
            return Err(SessionError::SubmissionInFlight);
        }

        let next_stage = match update.stage {
            Some(target) if target != self.stage => {
                self.stage
                    .transition_to(target)
                    .map_err(|_| SessionError::InvalidTransition {
                        from: self.stage,
                        to: target,
                    })?
            }
            _ => self.stage,
        };

        if let Some(category) = update.category {
            self.category = Some(category);
        }
        if let Some(sub_category) = update.sub_category {
            self.sub_category = Some(sub_category);
        }
        self.answers.extend(update.answers);
        self.asked.extend(update.asked);
        if let Some(awaiting) = update.awaiting_field {
            self.awaiting_field = awaiting;
        }
        if let Some(mut record) = update.submission {
            record.attempts = self.submission.as_ref().map_or(0, |r| r.attempts) + 1;
            self.submission = Some(record);
        }
        if update.acquire_claim {
            self.submission_claimed_at = Some(Timestamp::now());
        } else if update.release_claim {
            self.submission_claimed_at = None;
        }
        self.stage = next_stage;

        self.touch(ttl);
        Ok(())
    }

    /// Appends a turn to the transcript.
    pub fn append_turn(&mut self, turn: Turn, ttl: Duration) {
        self.transcript.push(turn);
        self.touch(ttl);
    }

    /// Removes every transcript turn.
    pub fn clear_transcript(&mut self, ttl: Duration) {
        self.transcript.clear();
        self.touch(ttl);
    }

    fn touch(&mut self, ttl: Duration) {
        let now = Timestamp::now();
        self.updated_at = now;
        self.expires_at = now.plus(ttl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ttl() -> Duration {
        Duration::days(7)
    }

    fn ready_session() -> Session {
        let mut session = Session::new(ClientContext::default(), ttl());
        session
            .apply(SessionUpdate::new().with_stage(SessionStage::ReadyToSubmit), ttl())
            .unwrap();
        session
    }

    #[test]
    fn new_session_starts_collecting_and_empty() {
        let session = Session::new(ClientContext::default(), ttl());
        assert_eq!(session.stage(), SessionStage::Collecting);
        assert!(session.answers().is_empty());
        assert!(session.asked().is_empty());
        assert!(session.transcript().is_empty());
        assert!(session.category().is_none());
        assert!(!session.is_expired());
    }

    #[test]
    fn update_slides_expiry_forward() {
        let mut session = Session::new(ClientContext::default(), Duration::seconds(5));
        let before = *session.expires_at();
        std::thread::sleep(std::time::Duration::from_millis(5));
        session
            .apply(SessionUpdate::new().mark_asked("first_name"), ttl())
            .unwrap();
        assert!(session.expires_at().is_after(&before));
        assert!(session.updated_at().is_after(session.created_at()));
    }

    #[test]
    fn answers_are_unique_by_field_name() {
        let mut session = Session::new(ClientContext::default(), ttl());
        session
            .apply(SessionUpdate::new().with_answer("first_name", "Jon"), ttl())
            .unwrap();
        session
            .apply(SessionUpdate::new().with_answer("first_name", "John"), ttl())
            .unwrap();
        assert_eq!(session.answers().len(), 1);
        assert_eq!(session.answer("first_name"), Some("John"));
    }

    #[test]
    fn expected_stage_mismatch_is_rejected_without_side_effects() {
        let mut session = Session::new(ClientContext::default(), ttl());
        let result = session.apply(
            SessionUpdate::new()
                .expect_stage(SessionStage::ReadyToSubmit)
                .with_answer("email", "a@b.co"),
            ttl(),
        );
        assert_eq!(
            result,
            Err(SessionError::StageConflict {
                expected: SessionStage::ReadyToSubmit,
                actual: SessionStage::Collecting,
            })
        );
        assert!(session.answers().is_empty());
    }

    #[test]
    fn submitted_session_cannot_return_to_collecting() {
        let mut session = ready_session();
        session
            .apply(SessionUpdate::new().with_stage(SessionStage::Submitted), ttl())
            .unwrap();

        for target in [SessionStage::Collecting, SessionStage::ReadyToSubmit] {
            let result = session.apply(SessionUpdate::new().with_stage(target), ttl());
            assert!(matches!(result, Err(SessionError::InvalidTransition { .. })));
        }
        assert_eq!(session.stage(), SessionStage::Submitted);
    }

    #[test]
    fn failed_submission_can_retry() {
        let mut session = ready_session();
        session
            .apply(SessionUpdate::new().with_stage(SessionStage::FailedSubmission), ttl())
            .unwrap();
        session
            .apply(SessionUpdate::new().with_stage(SessionStage::ReadyToSubmit), ttl())
            .unwrap();
        assert_eq!(session.stage(), SessionStage::ReadyToSubmit);
    }

    #[test]
    fn second_claim_is_rejected_until_released() {
        let mut session = ready_session();
        session
            .apply(SessionUpdate::new().acquire_claim(), ttl())
            .unwrap();
        assert!(session.has_live_claim());

        let second = session.apply(SessionUpdate::new().acquire_claim(), ttl());
        assert_eq!(second, Err(SessionError::SubmissionInFlight));

        session
            .apply(SessionUpdate::new().release_claim(), ttl())
            .unwrap();
        assert!(!session.has_live_claim());
    }

    #[test]
    fn submission_records_count_attempts() {
        let mut session = ready_session();
        session
            .apply(SessionUpdate::new().with_submission(SubmissionRecord::new()), ttl())
            .unwrap();
        let mut accepted = SubmissionRecord::new();
        accepted.lead_id = Some("L-1".into());
        session
            .apply(SessionUpdate::new().with_submission(accepted), ttl())
            .unwrap();

        let record = session.submission().unwrap();
        assert_eq!(record.attempts, 2);
        assert_eq!(session.lead_id(), Some("L-1"));
    }

    #[test]
    fn transcript_appends_in_order_and_clears_wholesale() {
        let mut session = Session::new(ClientContext::default(), ttl());
        session.append_turn(Turn::user("hi"), ttl());
        session.append_turn(Turn::assistant("hello"), ttl());
        let roles: Vec<_> = session.transcript().iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![TurnRole::User, TurnRole::Assistant]);

        session.clear_transcript(ttl());
        assert!(session.transcript().is_empty());
    }

    #[test]
    fn client_context_attribute_lookup() {
        let ctx = ClientContext {
            ip_address: Some("203.0.113.9".into()),
            user_agent: Some("Mozilla/5.0".into()),
            referrer: None,
        };
        assert_eq!(ctx.attribute("ip_address"), Some("203.0.113.9"));
        assert_eq!(ctx.attribute("user_agent"), Some("Mozilla/5.0"));
        assert_eq!(ctx.attribute("referrer"), None);
        assert_eq!(ctx.attribute("unknown"), None);

        let merged = ClientContext::default().or(&ctx);
        assert_eq!(merged.ip_address.as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn session_round_trips_through_json() {
        let mut session = Session::new(ClientContext::default(), ttl());
        session
            .apply(
                SessionUpdate::new()
                    .with_category("personal_injury", Some("car_accident".into()))
                    .with_answer("first_name", "John"),
                ttl(),
            )
            .unwrap();
        let json = serde_json::to_value(&session).unwrap();
        let back: Session = serde_json::from_value(json).unwrap();
        assert_eq!(back, session);
    }
}
