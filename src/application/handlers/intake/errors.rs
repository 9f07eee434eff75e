//! Errors surfaced by the intake command handlers.

use thiserror::Error;

use crate::application::submission::SubmissionError;
use crate::domain::category::CatalogError;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::SessionStoreError;

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("message cannot be empty")]
    EmptyMessage,

    #[error("message is {actual} characters, the limit is {max}")]
    MessageTooLong { max: usize, actual: usize },

    #[error("category '{0}' is not configured")]
    UnknownCategory(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Store(#[from] SessionStoreError),

    #[error("session disappeared mid-request")]
    SessionLost,

    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

impl IntakeError {
    pub fn code(&self) -> ErrorCode {
        match self {
            IntakeError::EmptyMessage | IntakeError::MessageTooLong { .. } => {
                ErrorCode::ValidationFailed
            }
            IntakeError::UnknownCategory(_) | IntakeError::Catalog(_) => {
                ErrorCode::ConfigurationError
            }
            IntakeError::Store(_) | IntakeError::SessionLost => ErrorCode::DatabaseError,
            IntakeError::Submission(err) if err.is_configuration() => ErrorCode::ConfigurationError,
            IntakeError::Submission(_) => ErrorCode::MarketplaceError,
        }
    }

    /// True when the caller sent something unusable.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            IntakeError::EmptyMessage | IntakeError::MessageTooLong { .. }
        )
    }
}

impl From<IntakeError> for DomainError {
    fn from(err: IntakeError) -> Self {
        DomainError::new(err.code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_input_is_a_client_error() {
        assert!(IntakeError::EmptyMessage.is_client_error());
        assert!(IntakeError::MessageTooLong { max: 4000, actual: 4001 }.is_client_error());
        assert!(!IntakeError::SessionLost.is_client_error());
    }

    #[test]
    fn codes_follow_failure_kind() {
        assert_eq!(IntakeError::EmptyMessage.code(), ErrorCode::ValidationFailed);
        assert_eq!(
            IntakeError::Store(SessionStoreError::unavailable("down")).code(),
            ErrorCode::DatabaseError
        );
        assert_eq!(
            IntakeError::Submission(SubmissionError::MissingRouting("x".into())).code(),
            ErrorCode::ConfigurationError
        );
        assert_eq!(
            IntakeError::UnknownCategory("x".into()).code(),
            ErrorCode::ConfigurationError
        );
    }

    #[test]
    fn too_long_message_names_both_lengths() {
        let err = IntakeError::MessageTooLong { max: 4000, actual: 4100 };
        assert_eq!(err.to_string(), "message is 4100 characters, the limit is 4000");
    }
}
