//! Field Extraction: one AI call over the requested fields, pattern
//! fallback, then best-effort city/state enrichment from a postal code.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::category::{CategoryConfig, Confidence, FieldDefinition, FieldType};
use crate::domain::extraction::{
    normalize_value, parse_json_object, scalar_as_string, Extraction, PatternExtractor,
};
use crate::domain::foundation::SessionId;
use crate::ports::{
    AIProvider, CompletionPurpose, CompletionRequest, Geocoder, MessageRole, RequestMetadata,
};

use super::detector::{confidence_of, DetectionFailure};
use super::fallback::{with_fallback, Resolved};

const CITY_FIELD: &str = "city";

/// One turn's extraction input.
#[derive(Debug, Clone)]
pub struct ExtractionRequest<'a> {
    pub session_id: SessionId,
    pub message: &'a str,
    /// Field names to fill; anything else the provider returns is ignored.
    pub fields: Vec<String>,
    /// The field the previous prompt asked for.
    pub awaiting: Option<&'a str>,
    pub answers: &'a BTreeMap<String, String>,
}

pub struct FieldExtractor {
    ai: Arc<dyn AIProvider>,
    ai_timeout: Duration,
    geocoder: Option<Arc<dyn Geocoder>>,
    geocode_timeout: Duration,
    patterns: PatternExtractor,
}

impl FieldExtractor {
    pub fn new(ai: Arc<dyn AIProvider>, ai_timeout: Duration) -> Self {
        Self {
            ai,
            ai_timeout,
            geocoder: None,
            geocode_timeout: Duration::from_secs(3),
            patterns: PatternExtractor::new(),
        }
    }

    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocoder>, timeout: Duration) -> Self {
        self.geocoder = Some(geocoder);
        self.geocode_timeout = timeout;
        self
    }

    /// Extracts values for the requested fields. Every value returned has
    /// passed local normalization for its declared type.
    pub async fn extract(
        &self,
        request: ExtractionRequest<'_>,
        category: &CategoryConfig,
    ) -> Resolved<Extraction> {
        let targets: Vec<(&str, &FieldDefinition)> = request
            .fields
            .iter()
            .filter_map(|name| category.field(name).map(|def| (name.as_str(), def)))
            .collect();
        if targets.is_empty() {
            return Resolved::primary(Extraction::empty());
        }

        let mut resolved = with_fallback(
            "field_extraction",
            self.ai_timeout,
            self.ask_ai(&request, category, &targets),
            |_: &Extraction| true,
            || self.patterns.extract(request.message, &targets, request.awaiting),
        )
        .await;

        self.enrich_location(&mut resolved.value, &request, category, &targets)
            .await;

        tracing::info!(
            session_id = %request.session_id,
            category = %category.key,
            strategy = resolved.strategy.as_str(),
            confidence = resolved.value.confidence.as_str(),
            fields = ?resolved.value.fields.keys().collect::<Vec<_>>(),
            "Field extraction finished"
        );
        resolved
    }

    async fn ask_ai(
        &self,
        request: &ExtractionRequest<'_>,
        category: &CategoryConfig,
        targets: &[(&str, &FieldDefinition)],
    ) -> Result<Extraction, DetectionFailure> {
        let completion = CompletionRequest::new(RequestMetadata::new(
            request.session_id,
            CompletionPurpose::FieldExtraction,
        ))
        .with_system_prompt(system_prompt(category, targets, request.awaiting))
        .with_message(MessageRole::User, request.message)
        .with_max_tokens(400)
        .with_temperature(0.0)
        .json();

        let response = self.ai.complete(completion).await?;
        let object = parse_json_object(&response.content)?;

        let mut fields = BTreeMap::new();
        for (name, def) in targets {
            let value = object
                .get(*name)
                .and_then(scalar_as_string)
                .and_then(|raw| normalize_value(def, &raw));
            match value {
                Some(value) => {
                    fields.insert(name.to_string(), value);
                }
                None if object.contains_key(*name) => {
                    tracing::debug!(field = %name, "Discarded extracted value that failed normalization");
                }
                None => {}
            }
        }

        let confidence = match object.get("confidence") {
            Some(value) => confidence_of(Some(value)),
            None if fields.is_empty() => Confidence::Low,
            None => Confidence::High,
        };
        Ok(Extraction { fields, confidence })
    }

    /// Fills city and state from a newly stated postal code. Failures and
    /// timeouts leave the extraction untouched.
    async fn enrich_location(
        &self,
        extraction: &mut Extraction,
        request: &ExtractionRequest<'_>,
        category: &CategoryConfig,
        targets: &[(&str, &FieldDefinition)],
    ) {
        let Some(geocoder) = &self.geocoder else {
            return;
        };
        let Some(zip) = targets
            .iter()
            .filter(|(_, def)| def.field_type == FieldType::ZipCode)
            .find_map(|(name, _)| extraction.fields.get(*name).cloned())
        else {
            return;
        };

        let absent = |name: &str| {
            !extraction.fields.contains_key(name) && !request.answers.contains_key(name)
        };
        let city = targets
            .iter()
            .find(|(name, _)| *name == CITY_FIELD)
            .filter(|(name, _)| absent(*name))
            .copied();
        let state = targets
            .iter()
            .find(|(_, def)| def.field_type == FieldType::State)
            .filter(|(name, _)| absent(*name))
            .copied();
        if city.is_none() && state.is_none() {
            return;
        }

        let place = match tokio::time::timeout(self.geocode_timeout, geocoder.lookup(&zip)).await {
            Ok(Ok(Some(place))) => place,
            Ok(Ok(None)) => {
                tracing::debug!(category = %category.key, "Postal code not found by geocoder");
                return;
            }
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "Geocoding failed, skipping enrichment");
                return;
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.geocode_timeout.as_millis() as u64,
                    "Geocoding timed out, skipping enrichment"
                );
                return;
            }
        };

        if let Some((name, def)) = city {
            if let Some(value) = normalize_value(def, &place.city) {
                extraction.fields.insert(name.to_string(), value);
            }
        }
        if let Some((name, def)) = state {
            if let Some(value) = normalize_value(def, &place.state) {
                extraction.fields.insert(name.to_string(), value);
            }
        }
    }
}

fn describe_field(name: &str, def: &FieldDefinition, category: &CategoryConfig) -> String {
    let label = category.label_for(name);
    let shape = match def.field_type {
        FieldType::Text => "free text".to_string(),
        FieldType::Email => "email address".to_string(),
        FieldType::Phone => "phone number, digits only".to_string(),
        FieldType::ZipCode => "US postal code".to_string(),
        FieldType::State => "two-letter US state code".to_string(),
        FieldType::Date => "date as MM/DD/YYYY".to_string(),
        FieldType::Numeric => "whole number".to_string(),
        FieldType::Enum => format!("one of: {}", def.allowed_values.join(", ")),
    };
    format!("- {name} ({label}): {shape}")
}

fn system_prompt(
    category: &CategoryConfig,
    targets: &[(&str, &FieldDefinition)],
    awaiting: Option<&str>,
) -> String {
    let mut lines = vec![
        format!(
            "You extract details from a visitor's message for a {} intake form.",
            category.name
        ),
        "Return a JSON object using only the field names below as keys, plus \"confidence\" (a number 0 to 1).".to_string(),
        "Only include a field when the message states its value. Never guess or invent a value.".to_string(),
        String::new(),
        "Fields:".to_string(),
    ];
    lines.extend(targets.iter().map(|(name, def)| describe_field(name, def, category)));
    if let Some(field) = awaiting {
        lines.push(String::new());
        lines.push(format!(
            "The visitor is replying to a question about {}.",
            category.label_for(field)
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAIProvider;
    use crate::adapters::geocoding::MockGeocoder;
    use crate::application::fallback::Strategy;
    use crate::domain::category::CategoryConfigSet;

    const DOC: &str = r#"
categories:
  personal_injury:
    name: Personal Injury
    keywords: [accident]
    fields:
      first_name: { type: text, required: true, source: user_provided, max_length: 50 }
      email: { type: email, required: true, source: user_provided }
      phone: { type: phone, required: true, source: user_provided }
      zip_code: { type: zip_code, required: true, source: user_provided }
      city: { type: text, source: user_provided }
      state: { type: state, source: user_provided }
      description: { type: text, source: user_provided, max_length: 1000 }
      medical_treatment: { type: enum, required: true, source: user_provided, allowed_values: ["Yes", "No"] }
    marketplace: { campaign_id: C1, supplier_id: S1, key: K1 }
"#;

    fn category() -> CategoryConfig {
        CategoryConfigSet::from_yaml_str(DOC)
            .unwrap()
            .get("personal_injury")
            .unwrap()
            .clone()
    }

    fn request<'a>(
        message: &'a str,
        fields: &[&str],
        awaiting: Option<&'a str>,
        answers: &'a BTreeMap<String, String>,
    ) -> ExtractionRequest<'a> {
        ExtractionRequest {
            session_id: SessionId::new(),
            message,
            fields: fields.iter().map(|f| f.to_string()).collect(),
            awaiting,
            answers,
        }
    }

    fn extractor(ai: MockAIProvider) -> FieldExtractor {
        FieldExtractor::new(Arc::new(ai), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn ai_values_are_normalized_and_filtered() {
        let ai = MockAIProvider::new().with_response(
            r#"{"email": "JANE@EXAMPLE.COM", "phone": "555", "medical_treatment": "yes",
                "ssn": "123-45-6789", "confidence": 0.9}"#,
        );
        let answers = BTreeMap::new();
        let resolved = extractor(ai)
            .extract(
                request("stuff", &["email", "phone", "medical_treatment"], None, &answers),
                &category(),
            )
            .await;

        assert_eq!(resolved.strategy, Strategy::Primary);
        let fields = &resolved.value.fields;
        assert_eq!(fields.get("email").map(String::as_str), Some("jane@example.com"));
        assert_eq!(fields.get("medical_treatment").map(String::as_str), Some("Yes"));
        assert!(!fields.contains_key("phone"));
        assert!(!fields.contains_key("ssn"));
        assert_eq!(resolved.value.confidence, Confidence::High);
    }

    #[tokio::test]
    async fn long_ai_values_are_kept_whole_or_dropped() {
        let fits = "x".repeat(800);
        let ai = MockAIProvider::new().with_response(format!(r#"{{"description": "{fits}"}}"#));
        let answers = BTreeMap::new();
        let resolved = extractor(ai)
            .extract(request("stuff", &["description"], None, &answers), &category())
            .await;
        assert_eq!(
            resolved.value.fields.get("description").map(String::len),
            Some(800)
        );

        let too_long = "x".repeat(1200);
        let ai = MockAIProvider::new().with_response(format!(r#"{{"description": "{too_long}"}}"#));
        let resolved = extractor(ai)
            .extract(request("stuff", &["description"], None, &answers), &category())
            .await;
        assert!(resolved.value.fields.is_empty());
    }

    #[tokio::test]
    async fn ai_outage_uses_patterns() {
        let answers = BTreeMap::new();
        let resolved = extractor(MockAIProvider::unavailable())
            .extract(
                request("my email is jane@example.com", &["first_name", "email"], Some("email"), &answers),
                &category(),
            )
            .await;

        assert_eq!(resolved.strategy, Strategy::Fallback);
        assert_eq!(
            resolved.value.fields.get("email").map(String::as_str),
            Some("jane@example.com")
        );
        assert_eq!(resolved.value.confidence, Confidence::Medium);
    }

    #[tokio::test]
    async fn short_number_never_reaches_phone() {
        let answers = BTreeMap::new();
        let resolved = extractor(MockAIProvider::unavailable())
            .extract(request("call me at 555", &["phone"], Some("phone"), &answers), &category())
            .await;
        assert!(resolved.value.fields.is_empty());
    }

    #[tokio::test]
    async fn zip_fills_city_and_state() {
        let geocoder = MockGeocoder::new().with_place("90210", "Beverly Hills", "CA");
        let answers = BTreeMap::new();
        let resolved = extractor(MockAIProvider::unavailable())
            .with_geocoder(Arc::new(geocoder), Duration::from_secs(1))
            .extract(
                request("90210", &["zip_code", "city", "state"], Some("zip_code"), &answers),
                &category(),
            )
            .await;

        let fields = &resolved.value.fields;
        assert_eq!(fields.get("zip_code").map(String::as_str), Some("90210"));
        assert_eq!(fields.get("city").map(String::as_str), Some("Beverly Hills"));
        assert_eq!(fields.get("state").map(String::as_str), Some("CA"));
    }

    #[tokio::test]
    async fn stated_city_is_not_overwritten() {
        let geocoder = MockGeocoder::new().with_place("90210", "Beverly Hills", "CA");
        let mut answers = BTreeMap::new();
        answers.insert("city".to_string(), "Los Angeles".to_string());
        let resolved = extractor(MockAIProvider::unavailable())
            .with_geocoder(Arc::new(geocoder), Duration::from_secs(1))
            .extract(
                request("90210", &["zip_code", "city", "state"], Some("zip_code"), &answers),
                &category(),
            )
            .await;

        assert!(!resolved.value.fields.contains_key("city"));
        assert_eq!(resolved.value.fields.get("state").map(String::as_str), Some("CA"));
    }

    #[tokio::test]
    async fn geocoder_failure_is_not_fatal() {
        let answers = BTreeMap::new();
        let resolved = extractor(MockAIProvider::unavailable())
            .with_geocoder(Arc::new(MockGeocoder::failing()), Duration::from_secs(1))
            .extract(
                request("90210", &["zip_code", "city", "state"], Some("zip_code"), &answers),
                &category(),
            )
            .await;

        assert_eq!(resolved.value.fields.len(), 1);
        assert!(resolved.value.fields.contains_key("zip_code"));
    }

    #[tokio::test]
    async fn slow_geocoder_is_skipped() {
        let geocoder = MockGeocoder::new()
            .with_place("90210", "Beverly Hills", "CA")
            .with_delay(Duration::from_millis(500));
        let answers = BTreeMap::new();
        let resolved = extractor(MockAIProvider::unavailable())
            .with_geocoder(Arc::new(geocoder), Duration::from_millis(20))
            .extract(
                request("90210", &["zip_code", "city"], Some("zip_code"), &answers),
                &category(),
            )
            .await;

        assert!(!resolved.value.fields.contains_key("city"));
    }

    #[tokio::test]
    async fn nothing_requested_skips_the_provider() {
        let ai = MockAIProvider::new();
        let answers = BTreeMap::new();
        let extractor = FieldExtractor::new(Arc::new(ai.clone()), Duration::from_secs(1));
        let resolved = extractor
            .extract(request("hello", &["unknown_field"], None, &answers), &category())
            .await;

        assert!(resolved.value.is_empty());
        assert_eq!(ai.call_count(), 0);
    }

    #[test]
    fn prompt_restricts_keys_and_names_awaited_field() {
        let category = category();
        let email = category.field("email").unwrap();
        let treatment = category.field("medical_treatment").unwrap();
        let prompt = system_prompt(
            &category,
            &[("email", email), ("medical_treatment", treatment)],
            Some("email"),
        );
        assert!(prompt.contains("- email (email): email address"));
        assert!(prompt.contains("- medical_treatment (medical treatment): one of: Yes, No"));
        assert!(prompt.contains("Never guess"));
        assert!(prompt.contains("replying to a question about email"));
    }
}
