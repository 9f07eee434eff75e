//! Lead marketplace port.
//!
//! HTTP submission of an assembled lead to the external marketplace. The
//! port performs exactly one attempt per call; retries are user driven.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::category::MarketplaceRouting;
use crate::domain::lead::LeadPayload;

/// One lead, ready to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadSubmission {
    pub routing: MarketplaceRouting,
    pub category: String,
    pub sub_category: Option<String>,
    pub payload: LeadPayload,
}

/// What the marketplace said about a lead it received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketplaceResponse {
    pub accepted: bool,
    pub lead_id: Option<String>,
    pub status: Option<String>,
    pub code: Option<i64>,
    pub message: Option<String>,
    /// Body as received, kept for operators.
    pub raw: Option<serde_json::Value>,
}

impl MarketplaceResponse {
    pub fn accepted(lead_id: impl Into<String>) -> Self {
        Self {
            accepted: true,
            lead_id: Some(lead_id.into()),
            status: Some("accepted".to_string()),
            code: None,
            message: None,
            raw: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            accepted: false,
            lead_id: None,
            status: Some("rejected".to_string()),
            code: None,
            message: Some(message.into()),
            raw: None,
        }
    }
}

/// Transport-level failures; a marketplace rejection is a response, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketplaceError {
    #[error("marketplace request timed out")]
    Timeout,

    #[error("marketplace unreachable: {0}")]
    Transport(String),

    #[error("marketplace returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("unexpected marketplace response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait LeadMarketplace: Send + Sync {
    async fn submit(&self, lead: &LeadSubmission) -> Result<MarketplaceResponse, MarketplaceError>;
}
