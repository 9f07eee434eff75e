//! Intake command handlers.

mod errors;
mod purge_expired_sessions;
mod reset_session;
mod send_message;

pub use errors::IntakeError;
pub use purge_expired_sessions::{PurgeExpiredSessionsHandler, PurgeExpiredSessionsResult};
pub use reset_session::{ResetSessionCommand, ResetSessionHandler, ResetSessionResult};
pub use send_message::{
    SendMessageCommand, SendMessageHandler, SendMessageResult, MAX_MESSAGE_LENGTH,
};
