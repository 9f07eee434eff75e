//! HTTP routes for intake endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{health, reset_session, send_message, IntakeHandlers};

/// Routes mounted under `/api/intake`.
pub fn intake_routes(handlers: IntakeHandlers) -> Router {
    Router::new()
        .route("/messages", post(send_message))
        .route("/reset", post(reset_session))
        .with_state(handlers)
}

/// The complete inbound surface: intake endpoints plus `/health`.
pub fn app_router(handlers: IntakeHandlers) -> Router {
    Router::new()
        .nest("/api/intake", intake_routes(handlers))
        .route("/health", get(health))
}
