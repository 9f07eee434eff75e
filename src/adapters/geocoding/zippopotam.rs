//! Zippopotam.us geocoder.
//!
//! `GET {base_url}/us/{zip}` returns the places for a US postal code. A 404
//! means the code is unknown.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::ports::{GeocodeError, Geocoder, Place};

pub const DEFAULT_BASE_URL: &str = "https://api.zippopotam.us";

#[derive(Debug, Clone)]
pub struct ZippopotamGeocoder {
    base_url: String,
    client: Client,
}

impl ZippopotamGeocoder {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder().timeout(timeout).build().unwrap_or_default();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ZipResponse {
    #[serde(default)]
    places: Vec<ZipPlace>,
}

#[derive(Debug, Deserialize)]
struct ZipPlace {
    #[serde(rename = "place name")]
    place_name: String,
    #[serde(rename = "state abbreviation")]
    state_abbreviation: String,
}

#[async_trait]
impl Geocoder for ZippopotamGeocoder {
    async fn lookup(&self, zip: &str) -> Result<Option<Place>, GeocodeError> {
        let five: String = zip.chars().filter(|c| c.is_ascii_digit()).take(5).collect();
        if five.len() != 5 {
            return Ok(None);
        }

        let response = self
            .client
            .get(format!("{}/us/{}", self.base_url, five))
            .send()
            .await
            .map_err(|e| GeocodeError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            status if !status.is_success() => {
                return Err(GeocodeError::Unavailable(format!("status {status}")));
            }
            _ => {}
        }

        let body: ZipResponse = response
            .json()
            .await
            .map_err(|e| GeocodeError::InvalidResponse(e.to_string()))?;

        Ok(body.places.into_iter().next().map(|p| Place {
            city: p.place_name,
            state: p.state_abbreviation.to_ascii_uppercase(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn geocoder(server: &MockServer) -> ZippopotamGeocoder {
        ZippopotamGeocoder::new(server.uri(), Duration::from_secs(2))
    }

    #[tokio::test]
    async fn resolves_city_and_state() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/us/90210"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "post code": "90210",
                "country": "United States",
                "places": [{
                    "place name": "Beverly Hills",
                    "state": "California",
                    "state abbreviation": "CA"
                }]
            })))
            .mount(&server)
            .await;

        let place = geocoder(&server).await.lookup("90210-1234").await.unwrap();
        assert_eq!(
            place,
            Some(Place {
                city: "Beverly Hills".into(),
                state: "CA".into()
            })
        );
    }

    #[tokio::test]
    async fn unknown_zip_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({})))
            .mount(&server)
            .await;

        assert_eq!(geocoder(&server).await.lookup("00000").await.unwrap(), None);
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = geocoder(&server).await.lookup("90210").await.unwrap_err();
        assert!(matches!(err, GeocodeError::Unavailable(_)));
    }

    #[tokio::test]
    async fn malformed_zip_skips_network() {
        let server = MockServer::start().await;
        assert_eq!(geocoder(&server).await.lookup("123").await.unwrap(), None);
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }
}
