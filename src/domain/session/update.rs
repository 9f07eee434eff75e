//! Partial changes applied to a session by the store.

use std::collections::BTreeMap;

use super::{SessionStage, SubmissionRecord};

/// A partial change to a [`Session`](super::Session).
///
/// Built by the engine and handed to the session store, which applies it to
/// the freshest copy of the record. Fields left unset are not touched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionUpdate {
    pub(super) expected_stage: Option<SessionStage>,
    pub(super) category: Option<String>,
    pub(super) sub_category: Option<String>,
    pub(super) answers: BTreeMap<String, String>,
    pub(super) asked: Vec<String>,
    pub(super) awaiting_field: Option<Option<String>>,
    pub(super) stage: Option<SessionStage>,
    pub(super) submission: Option<SubmissionRecord>,
    pub(super) acquire_claim: bool,
    pub(super) release_claim: bool,
}

impl SessionUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only apply if the stored session is still in `stage`.
    pub fn expect_stage(mut self, stage: SessionStage) -> Self {
        self.expected_stage = Some(stage);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>, sub_category: Option<String>) -> Self {
        self.category = Some(category.into());
        self.sub_category = sub_category;
        self
    }

    pub fn with_answer(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.answers.insert(field.into(), value.into());
        self
    }

    pub fn with_answers(mut self, answers: BTreeMap<String, String>) -> Self {
        self.answers.extend(answers);
        self
    }

    pub fn mark_asked(mut self, field: impl Into<String>) -> Self {
        self.asked.push(field.into());
        self
    }

    /// Records the field the outgoing prompt asks for (`None` clears it).
    pub fn awaiting(mut self, field: Option<String>) -> Self {
        self.awaiting_field = Some(field);
        self
    }

    pub fn with_stage(mut self, stage: SessionStage) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn with_submission(mut self, record: SubmissionRecord) -> Self {
        self.submission = Some(record);
        self
    }

    /// Takes the submission claim; rejected if another request holds it.
    pub fn acquire_claim(mut self) -> Self {
        self.acquire_claim = true;
        self.release_claim = false;
        self
    }

    pub fn release_claim(mut self) -> Self {
        self.release_claim = true;
        self.acquire_claim = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_flags_are_mutually_exclusive() {
        let update = SessionUpdate::new().acquire_claim().release_claim();
        assert!(update.release_claim);
        assert!(!update.acquire_claim);
    }

    #[test]
    fn later_answer_for_same_field_wins() {
        let update = SessionUpdate::new()
            .with_answer("email", "a@b.co")
            .with_answer("email", "c@d.co");
        assert_eq!(update.answers.get("email").map(String::as_str), Some("c@d.co"));
        assert_eq!(update.answers.len(), 1);
    }
}
