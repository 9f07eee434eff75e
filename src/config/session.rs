//! Session store configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub backend: SessionBackend,

    /// Sliding time-to-live in days
    #[serde(default = "default_ttl_days")]
    pub ttl_days: u32,

    /// Seconds between expired-session purges; 0 disables the task
    #[serde(default = "default_purge_interval")]
    pub purge_interval_secs: u64,
}

/// Where sessions are kept
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    #[default]
    Memory,
    Postgres,
}

impl SessionConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.ttl_days))
    }

    /// `None` when the periodic purge is disabled.
    pub fn purge_interval(&self) -> Option<Duration> {
        (self.purge_interval_secs > 0).then(|| Duration::from_secs(self.purge_interval_secs))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.ttl_days == 0 {
            return Err(ValidationError::InvalidSessionTtl);
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::default(),
            ttl_days: default_ttl_days(),
            purge_interval_secs: default_purge_interval(),
        }
    }
}

fn default_ttl_days() -> u32 {
    7
}

fn default_purge_interval() -> u64 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.backend, SessionBackend::Memory);
        assert_eq!(config.ttl(), chrono::Duration::days(7));
        assert_eq!(config.purge_interval(), Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_zero_interval_disables_purge() {
        let config = SessionConfig {
            purge_interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.purge_interval(), None);
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let config = SessionConfig {
            ttl_days: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidSessionTtl));
    }
}
