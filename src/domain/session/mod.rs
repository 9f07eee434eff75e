//! Session module - the state of one intake conversation.

mod aggregate;
mod errors;
mod stage;
mod update;

pub use aggregate::{
    ClientContext, Session, SubmissionRecord, Turn, TurnRole, SUBMISSION_CLAIM_TTL_SECS,
};
pub use errors::SessionError;
pub use stage::SessionStage;
pub use update::SessionUpdate;
