//! Category catalog configuration

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Path to the category document
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// How long a parsed document is served before re-reading, in seconds
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

impl CatalogConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.path.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("CATALOG__PATH"));
        }
        if self.cache_ttl_secs == 0 {
            return Err(ValidationError::InvalidCacheTtl);
        }
        Ok(())
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            cache_ttl_secs: default_cache_ttl(),
        }
    }
}

fn default_path() -> PathBuf {
    PathBuf::from("catalog/categories.yaml")
}

fn default_cache_ttl() -> u64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_defaults() {
        let config = CatalogConfig::default();
        assert_eq!(config.path, PathBuf::from("catalog/categories.yaml"));
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let config = CatalogConfig {
            cache_ttl_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidCacheTtl));
    }
}
