//! Lead marketplace configuration

use serde::Deserialize;
use std::time::Duration;

use super::ai::is_http_url;
use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct MarketplaceConfig {
    /// Marketplace API root; absent outside production means the mock marketplace
    pub base_url: Option<String>,

    pub api_key: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl MarketplaceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }

    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 || self.timeout_secs > 120 {
            return Err(ValidationError::InvalidCallTimeout("marketplace"));
        }
        match self.base_url() {
            None if production => Err(ValidationError::MissingRequired("MARKETPLACE__BASE_URL")),
            None => Ok(()),
            Some(url) if !is_http_url(url) => Err(ValidationError::InvalidServiceUrl("marketplace")),
            Some(url) if production && !url.starts_with("https://") => {
                Err(ValidationError::MustBeHttps("marketplace URL"))
            }
            Some(_) => Ok(()),
        }
    }
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    15
}
