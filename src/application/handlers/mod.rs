//! Application handlers.
//!
//! Command handlers that orchestrate the intake services and the ports.

pub mod intake;

pub use intake::{
    IntakeError, PurgeExpiredSessionsHandler, PurgeExpiredSessionsResult, ResetSessionCommand,
    ResetSessionHandler, ResetSessionResult, SendMessageCommand, SendMessageHandler,
    SendMessageResult, MAX_MESSAGE_LENGTH,
};
