//! Application layer - services and command handlers.
//!
//! Orchestrates the domain rules against the ports. The services here are
//! shared by the handlers; the handlers are what the inbound adapters call.

pub mod catalog;
pub mod detector;
pub mod extractor;
pub mod fallback;
pub mod handlers;
pub mod schema_registry;
pub mod submission;

pub use catalog::{CatalogSnapshot, CategoryCatalog};
pub use detector::{CategoryDetector, DetectionFailure};
pub use extractor::{ExtractionRequest, FieldExtractor};
pub use fallback::{with_fallback, Resolved, Strategy};
pub use handlers::{
    IntakeError, PurgeExpiredSessionsHandler, PurgeExpiredSessionsResult, ResetSessionCommand,
    ResetSessionHandler, ResetSessionResult, SendMessageCommand, SendMessageHandler,
    SendMessageResult, MAX_MESSAGE_LENGTH,
};
pub use schema_registry::SchemaRegistry;
pub use submission::{LeadSubmissionService, SubmissionError, SubmissionOutcome};
