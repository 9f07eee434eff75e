//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables with the
//! `config` and `dotenvy` crates. Variables use the `LEAD_INTAKE` prefix and
//! `__` between nested keys.
//!
//! # Example
//!
//! ```no_run
//! use lead_intake::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {:?}", config.server.socket_addr());
//! ```

mod ai;
mod catalog;
mod database;
mod error;
mod geocoding;
mod marketplace;
mod server;
mod session;

pub use ai::AiConfig;
pub use catalog::CatalogConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use geocoding::GeocodingConfig;
pub use marketplace::MarketplaceConfig;
pub use server::{Environment, ServerConfig};
pub use session::{SessionBackend, SessionConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a runnable
/// development setup: in-memory sessions, deterministic detection and a mock
/// marketplace.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub marketplace: MarketplaceConfig,

    #[serde(default)]
    pub geocoding: GeocodingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Loads `.env` if present, then reads `LEAD_INTAKE__*` variables:
    ///
    /// - `LEAD_INTAKE__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `LEAD_INTAKE__SESSION__BACKEND=postgres` -> `session.backend`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value cannot be parsed into its field type.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("LEAD_INTAKE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// The database section is only checked when sessions live in
    /// PostgreSQL.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.ai.validate()?;
        self.catalog.validate()?;
        self.session.validate()?;
        if self.session.backend == SessionBackend::Postgres {
            self.database.validate()?;
        }
        self.marketplace.validate(self.is_production())?;
        self.geocoding.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
