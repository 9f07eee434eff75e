//! Lead marketplace adapters.

mod http_marketplace;
mod mock;

pub use http_marketplace::{HttpMarketplace, HttpMarketplaceConfig};
pub use mock::MockMarketplace;
