//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, error types and the state machine
//! trait that the rest of the intake domain builds on.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::SessionId;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
