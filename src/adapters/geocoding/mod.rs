//! Geocoding adapters.

mod mock;
mod zippopotam;

pub use mock::MockGeocoder;
pub use zippopotam::{ZippopotamGeocoder, DEFAULT_BASE_URL as ZIPPOPOTAM_BASE_URL};
