//! HTTP handlers for intake endpoints.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::application::{
    IntakeError, ResetSessionCommand, ResetSessionHandler, SendMessageCommand, SendMessageHandler,
};
use crate::domain::foundation::SessionId;
use crate::domain::session::ClientContext;

use super::dto::{
    ErrorResponse, ResetSessionRequest, ResetSessionResponse, SendMessageRequest,
    SendMessageResponse,
};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct IntakeHandlers {
    send_handler: Arc<SendMessageHandler>,
    reset_handler: Arc<ResetSessionHandler>,
}

impl IntakeHandlers {
    pub fn new(send_handler: Arc<SendMessageHandler>, reset_handler: Arc<ResetSessionHandler>) -> Self {
        Self {
            send_handler,
            reset_handler,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/intake/messages - Handle one visitor message
pub async fn send_message(
    State(handlers): State<IntakeHandlers>,
    headers: HeaderMap,
    Json(req): Json<SendMessageRequest>,
) -> Response {
    // A malformed id is treated like an expired one.
    let session_id = req.session_id.as_deref().and_then(|raw| {
        let parsed = raw.parse::<SessionId>().ok();
        if parsed.is_none() {
            tracing::debug!("Ignoring malformed session id");
        }
        parsed
    });

    let cmd = SendMessageCommand::new(session_id, req.message)
        .with_client(client_context(&headers))
        .with_tracking(req.tracking);

    match handlers.send_handler.handle(cmd).await {
        Ok(result) => (StatusCode::OK, Json(SendMessageResponse::from(result))).into_response(),
        Err(e) => handle_intake_error(e),
    }
}

/// POST /api/intake/reset - Forget a session
pub async fn reset_session(
    State(handlers): State<IntakeHandlers>,
    Json(req): Json<ResetSessionRequest>,
) -> Response {
    let session_id = match req.session_id.parse::<SessionId>() {
        Ok(id) => id,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::bad_request("Invalid session ID")),
            )
                .into_response()
        }
    };

    match handlers
        .reset_handler
        .handle(ResetSessionCommand { session_id })
        .await
    {
        Ok(result) => (StatusCode::OK, Json(ResetSessionResponse::from(result))).into_response(),
        Err(e) => handle_intake_error(e.into()),
    }
}

/// GET /health
pub async fn health() -> &'static str {
    "ok"
}

// ════════════════════════════════════════════════════════════════════════════
// Request context
// ════════════════════════════════════════════════════════════════════════════

fn header_value(headers: &HeaderMap, name: impl header::AsHeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Visitor attributes from the request headers. The client IP is the first
/// `X-Forwarded-For` hop, else `X-Real-IP`.
pub fn client_context(headers: &HeaderMap) -> ClientContext {
    let forwarded = header_value(headers, "x-forwarded-for").and_then(|v| {
        v.split(',')
            .map(str::trim)
            .find(|hop| !hop.is_empty())
            .map(str::to_string)
    });
    ClientContext {
        ip_address: forwarded.or_else(|| header_value(headers, "x-real-ip")),
        user_agent: header_value(headers, header::USER_AGENT),
        referrer: header_value(headers, header::REFERER),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Error handling
// ════════════════════════════════════════════════════════════════════════════

fn handle_intake_error(error: IntakeError) -> Response {
    if error.is_client_error() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request(error.to_string())),
        )
            .into_response();
    }
    tracing::error!(code = %error.code(), error = %error, "Intake request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse::internal())).into_response()
}
