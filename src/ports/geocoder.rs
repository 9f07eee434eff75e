//! Geocoding port - postal code to city/state.
//!
//! Best-effort enrichment. Callers bound every lookup with a timeout and
//! continue without enrichment on any failure.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A resolved place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub city: String,
    /// Two-letter state code.
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeocodeError {
    #[error("geocoding service unavailable: {0}")]
    Unavailable(String),

    #[error("unexpected geocoding response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Looks up a five-digit ZIP code. `Ok(None)` means the code is unknown.
    async fn lookup(&self, zip: &str) -> Result<Option<Place>, GeocodeError>;
}
