//! Postal-code geocoding configuration

use serde::Deserialize;
use std::time::Duration;

use super::ai::is_http_url;
use super::error::ValidationError;
use crate::adapters::geocoding::ZIPPOPOTAM_BASE_URL;

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl GeocodingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.enabled {
            return Ok(());
        }
        if self.timeout_secs == 0 || self.timeout_secs > 30 {
            return Err(ValidationError::InvalidCallTimeout("geocoding"));
        }
        if !is_http_url(&self.base_url) {
            return Err(ValidationError::InvalidServiceUrl("geocoding"));
        }
        Ok(())
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_base_url() -> String {
    ZIPPOPOTAM_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    3
}
