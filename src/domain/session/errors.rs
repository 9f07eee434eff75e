//! Session-specific error types.

use thiserror::Error;

use super::SessionStage;
use crate::domain::foundation::{DomainError, ErrorCode};

/// Rejections raised while applying a change to a session.
///
/// These are expected outcomes of concurrent requests or illegal input, not
/// infrastructure failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The update was conditional on a stage the session has since left.
    #[error("expected stage {expected}, session is {actual}")]
    StageConflict {
        expected: SessionStage,
        actual: SessionStage,
    },

    /// Another request currently holds the submission claim.
    #[error("a submission is already in flight for this session")]
    SubmissionInFlight,

    /// The stage machine does not allow this edge.
    #[error("cannot transition from {from} to {to}")]
    InvalidTransition {
        from: SessionStage,
        to: SessionStage,
    },
}

impl SessionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            SessionError::StageConflict { actual, .. } if *actual == SessionStage::Submitted => {
                ErrorCode::AlreadySubmitted
            }
            SessionError::StageConflict { .. } => ErrorCode::InvalidStateTransition,
            SessionError::SubmissionInFlight => ErrorCode::SubmissionInFlight,
            SessionError::InvalidTransition { .. } => ErrorCode::InvalidStateTransition,
        }
    }
}

impl From<SessionError> for DomainError {
    fn from(err: SessionError) -> Self {
        DomainError::new(err.code(), err.to_string())
    }
}
