//! HTTP lead marketplace client.
//!
//! Posts one JSON document per lead to `{base_url}/leads`:
//!
//! ```json
//! {
//!   "campaign_id": "PI-CHAT-001",
//!   "supplier_id": "LEGAL-DIR",
//!   "key": "pi-routing-key",
//!   "category": "personal_injury",
//!   "sub_category": "car_accident",
//!   "fields": { "first_name": "John", ... }
//! }
//! ```
//!
//! A 2xx reply is read as `{status, lead_id, code?, message?}`. A 4xx reply
//! with a JSON body is a marketplace rejection; anything else is an error.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::ports::{LeadMarketplace, LeadSubmission, MarketplaceError, MarketplaceResponse};

const ACCEPTED_STATUSES: &[&str] = &["accepted", "success", "ok", "sold", "matched"];

#[derive(Debug, Clone)]
pub struct HttpMarketplaceConfig {
    pub base_url: String,
    api_key: Option<Secret<String>>,
    pub timeout: Duration,
}

impl HttpMarketplaceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            timeout: Duration::from_secs(15),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(Secret::new(key.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct HttpMarketplace {
    config: HttpMarketplaceConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct LeadRequest<'a> {
    campaign_id: &'a str,
    supplier_id: &'a str,
    key: &'a str,
    category: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sub_category: Option<&'a str>,
    fields: &'a BTreeMap<String, String>,
}

impl HttpMarketplace {
    pub fn new(config: HttpMarketplaceConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    fn leads_url(&self) -> String {
        format!("{}/leads", self.config.base_url)
    }

    /// Reads the marketplace's JSON verdict.
    fn interpret(body: Value, http_status: u16) -> MarketplaceResponse {
        let text = |key: &str| -> Option<String> {
            match body.get(key) {
                Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            }
        };

        let status = text("status");
        let lead_id = text("lead_id").or_else(|| text("leadId")).or_else(|| text("id"));
        let explicit = body
            .get("success")
            .or_else(|| body.get("accepted"))
            .and_then(Value::as_bool);
        let status_ok = status
            .as_deref()
            .map(|s| ACCEPTED_STATUSES.contains(&s.to_ascii_lowercase().as_str()));

        let accepted = (200..300).contains(&http_status)
            && explicit.or(status_ok).unwrap_or(lead_id.is_some())
            && lead_id.is_some();

        MarketplaceResponse {
            accepted,
            lead_id,
            status,
            code: body
                .get("code")
                .and_then(Value::as_i64)
                .or(Some(i64::from(http_status))),
            message: text("message").or_else(|| text("error")),
            raw: Some(body),
        }
    }
}

#[async_trait]
impl LeadMarketplace for HttpMarketplace {
    async fn submit(&self, lead: &LeadSubmission) -> Result<MarketplaceResponse, MarketplaceError> {
        let request = LeadRequest {
            campaign_id: &lead.routing.campaign_id,
            supplier_id: &lead.routing.supplier_id,
            key: &lead.routing.key,
            category: &lead.category,
            sub_category: lead.sub_category.as_deref(),
            fields: lead.payload.fields(),
        };

        let mut builder = self.client.post(self.leads_url()).json(&request);
        if let Some(ref key) = self.config.api_key {
            builder = builder.header("X-Api-Key", key.expose_secret());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                MarketplaceError::Timeout
            } else {
                MarketplaceError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MarketplaceError::Transport(e.to_string()))?;
        let json = serde_json::from_str::<Value>(&body).ok().filter(Value::is_object);

        match json {
            Some(json) if status.is_success() || status.is_client_error() => {
                Ok(Self::interpret(json, status.as_u16()))
            }
            _ if status.is_success() => Err(MarketplaceError::InvalidResponse(body)),
            _ => Err(MarketplaceError::Http {
                status: status.as_u16(),
                body,
            }),
        }
    }
}
