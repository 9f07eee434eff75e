//! Ports - interfaces to every external collaborator.
//!
//! - `ai_provider` - text-in/JSON-out completion service
//! - `session_store` - durable session records with sliding TTL
//! - `category_source` - the category configuration document
//! - `geocoder` - postal code to city/state lookup
//! - `lead_marketplace` - external lead submission

mod ai_provider;
mod category_source;
mod geocoder;
mod lead_marketplace;
mod session_store;

pub use ai_provider::{
    AIError, AIProvider, CompletionPurpose, CompletionRequest, CompletionResponse, FinishReason,
    Message, MessageRole, ProviderInfo, RequestMetadata, TokenUsage,
};
pub use category_source::CategorySource;
pub use geocoder::{GeocodeError, Geocoder, Place};
pub use lead_marketplace::{
    LeadMarketplace, LeadSubmission, MarketplaceError, MarketplaceResponse,
};
pub use session_store::{SessionStore, SessionStoreError};
