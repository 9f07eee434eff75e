//! HTTP adapter for the intake widget.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    ErrorResponse, ResetSessionRequest, ResetSessionResponse, SendMessageRequest,
    SendMessageResponse,
};
pub use handlers::{client_context, IntakeHandlers};
pub use routes::{app_router, intake_routes};
