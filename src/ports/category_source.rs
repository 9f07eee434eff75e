//! Category source port.
//!
//! A static, versioned document of category configurations. Sources only
//! read and validate; caching lives in the application layer.

use async_trait::async_trait;

use crate::domain::category::{CatalogError, CategoryConfigSet};

#[async_trait]
pub trait CategorySource: Send + Sync {
    /// Loads and structurally validates the full document.
    async fn load(&self) -> Result<CategoryConfigSet, CatalogError>;

    /// Human-readable origin for logs (a path, "in-memory", ...).
    fn describe(&self) -> String;
}
