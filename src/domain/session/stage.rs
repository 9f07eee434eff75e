//! SessionStage enum for tracking the lifecycle of an intake conversation.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Lifecycle stage of an intake session.
///
/// ```text
/// COLLECTING ──> READY_TO_SUBMIT ──> SUBMITTED
///     │                │  ▲
///     └──> FAILED_SUBMISSION ┘ (retry)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStage {
    #[default]
    Collecting,
    ReadyToSubmit,
    Submitted,
    FailedSubmission,
}

impl SessionStage {
    /// Stable storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStage::Collecting => "COLLECTING",
            SessionStage::ReadyToSubmit => "READY_TO_SUBMIT",
            SessionStage::Submitted => "SUBMITTED",
            SessionStage::FailedSubmission => "FAILED_SUBMISSION",
        }
    }
}

impl StateMachine for SessionStage {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SessionStage::*;
        matches!(
            (self, target),
            (Collecting, ReadyToSubmit)
                | (Collecting, FailedSubmission)
                | (ReadyToSubmit, Submitted)
                | (ReadyToSubmit, FailedSubmission)
                | (FailedSubmission, ReadyToSubmit)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SessionStage::*;
        match self {
            Collecting => vec![ReadyToSubmit, FailedSubmission],
            ReadyToSubmit => vec![Submitted, FailedSubmission],
            FailedSubmission => vec![ReadyToSubmit],
            Submitted => vec![],
        }
    }
}

impl fmt::Display for SessionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [SessionStage; 4] = [
        SessionStage::Collecting,
        SessionStage::ReadyToSubmit,
        SessionStage::Submitted,
        SessionStage::FailedSubmission,
    ];

    #[test]
    fn default_is_collecting() {
        assert_eq!(SessionStage::default(), SessionStage::Collecting);
    }

    #[test]
    fn submitted_is_terminal() {
        assert!(SessionStage::Submitted.is_terminal());
        for stage in ALL {
            assert!(!SessionStage::Submitted.can_transition_to(&stage));
        }
    }

    #[test]
    fn only_backward_edge_is_failed_to_ready() {
        assert!(SessionStage::FailedSubmission.can_transition_to(&SessionStage::ReadyToSubmit));
        assert!(!SessionStage::ReadyToSubmit.can_transition_to(&SessionStage::Collecting));
        assert!(!SessionStage::FailedSubmission.can_transition_to(&SessionStage::Collecting));
        assert!(!SessionStage::FailedSubmission.can_transition_to(&SessionStage::Submitted));
    }

    #[test]
    fn collecting_cannot_skip_to_submitted() {
        let result = SessionStage::Collecting.transition_to(SessionStage::Submitted);
        assert!(result.is_err());
    }

    #[test]
    fn can_transition_to_is_consistent_with_valid_transitions() {
        for stage in ALL {
            for target in ALL {
                assert_eq!(
                    stage.can_transition_to(&target),
                    stage.valid_transitions().contains(&target),
                    "{:?} -> {:?}",
                    stage,
                    target
                );
            }
        }
    }

    #[test]
    fn serializes_to_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&SessionStage::ReadyToSubmit).unwrap(),
            "\"READY_TO_SUBMIT\""
        );
        let stage: SessionStage = serde_json::from_str("\"FAILED_SUBMISSION\"").unwrap();
        assert_eq!(stage, SessionStage::FailedSubmission);
    }

    #[test]
    fn display_matches_storage_form() {
        for stage in ALL {
            assert_eq!(stage.to_string(), stage.as_str());
        }
    }
}
