//! Mock geocoder for tests and offline runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::ports::{GeocodeError, Geocoder, Place};

/// Answers from a fixed table; can be made to fail or stall.
#[derive(Debug, Clone, Default)]
pub struct MockGeocoder {
    places: HashMap<String, Place>,
    fail: bool,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_place(mut self, zip: &str, city: &str, state: &str) -> Self {
        self.places.insert(
            zip.to_string(),
            Place {
                city: city.to_string(),
                state: state.to_string(),
            },
        );
        self
    }

    /// Every lookup fails with `Unavailable`.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn lookup(&self, zip: &str) -> Result<Option<Place>, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(GeocodeError::Unavailable("mock geocoder offline".into()));
        }
        let five: String = zip.chars().take(5).collect();
        Ok(self.places.get(&five).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn looks_up_by_five_digit_prefix() {
        let geocoder = MockGeocoder::new().with_place("90210", "Beverly Hills", "CA");
        let place = geocoder.lookup("90210-1234").await.unwrap().unwrap();
        assert_eq!(place.city, "Beverly Hills");
        assert_eq!(geocoder.lookup("10001").await.unwrap(), None);
        assert_eq!(geocoder.call_count(), 2);
    }

    #[tokio::test]
    async fn failing_geocoder_errors() {
        assert!(MockGeocoder::failing().lookup("90210").await.is_err());
    }
}
