//! HTTP DTOs for intake endpoints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::application::{ResetSessionResult, SendMessageResult};
use crate::domain::session::SessionStage;

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// One visitor message.
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    pub message: String,
    /// Consent-proof and tracking identifiers, passed through untouched.
    #[serde(default)]
    pub tracking: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetSessionRequest {
    pub session_id: String,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub reply: String,
    pub session_id: String,
    pub complete: bool,
    pub stage: SessionStage,
}

impl From<SendMessageResult> for SendMessageResponse {
    fn from(result: SendMessageResult) -> Self {
        Self {
            reply: result.reply,
            session_id: result.session_id.to_string(),
            complete: result.complete,
            stage: result.stage,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetSessionResponse {
    pub reset: bool,
}

impl From<ResetSessionResult> for ResetSessionResponse {
    fn from(result: ResetSessionResult) -> Self {
        Self {
            reset: result.reset,
        }
    }
}

/// Error body. Server-side failures carry a generic message only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn internal() -> Self {
        Self::new(
            "INTERNAL_ERROR",
            "Something went wrong on our end. Please try again in a moment.",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SessionId;

    #[test]
    fn request_fields_are_optional_except_message() {
        let req: SendMessageRequest = serde_json::from_str(r#"{"message": "hi"}"#).unwrap();
        assert!(req.session_id.is_none());
        assert!(req.tracking.is_empty());
    }

    #[test]
    fn response_serializes_stage_in_screaming_case() {
        let response = SendMessageResponse::from(SendMessageResult {
            reply: "ok".into(),
            session_id: SessionId::new(),
            complete: false,
            stage: SessionStage::ReadyToSubmit,
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["stage"], "READY_TO_SUBMIT");
        assert_eq!(json["complete"], false);
    }
}
