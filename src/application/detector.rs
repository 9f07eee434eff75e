//! Category Detection: AI classification with keyword fallback.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::domain::category::{
    detect_by_keywords, match_sub_category, CategoryConfigSet, Confidence, Detection,
};
use crate::domain::extraction::{parse_json_object, scalar_as_string, ResponseParseError};
use crate::domain::foundation::SessionId;
use crate::ports::{AIError, AIProvider, CompletionPurpose, CompletionRequest, MessageRole, RequestMetadata};

use super::fallback::{with_fallback, Resolved};

/// Why an AI classification could not be used.
#[derive(Debug, Error)]
pub enum DetectionFailure {
    #[error(transparent)]
    Provider(#[from] AIError),

    #[error(transparent)]
    Response(#[from] ResponseParseError),

    #[error("classifier returned unknown category '{0}'")]
    UnknownCategory(String),
}

pub struct CategoryDetector {
    ai: Arc<dyn AIProvider>,
    timeout: Duration,
}

impl CategoryDetector {
    pub fn new(ai: Arc<dyn AIProvider>, timeout: Duration) -> Self {
        Self { ai, timeout }
    }

    /// Classifies `message`. A miss of both strategies yields
    /// [`Detection::none`].
    pub async fn detect(
        &self,
        session_id: SessionId,
        message: &str,
        categories: &CategoryConfigSet,
    ) -> Resolved<Detection> {
        let resolved = with_fallback(
            "category_detection",
            self.timeout,
            self.classify(session_id, message, categories),
            |d: &Detection| d.is_detected() && d.confidence >= Confidence::Medium,
            || detect_by_keywords(message, categories),
        )
        .await;

        tracing::info!(
            session_id = %session_id,
            category = resolved.value.category.as_deref().unwrap_or("none"),
            sub_category = resolved.value.sub_category.as_deref().unwrap_or("none"),
            confidence = resolved.value.confidence.as_str(),
            strategy = resolved.strategy.as_str(),
            "Category detection finished"
        );
        resolved
    }

    async fn classify(
        &self,
        session_id: SessionId,
        message: &str,
        categories: &CategoryConfigSet,
    ) -> Result<Detection, DetectionFailure> {
        let request = CompletionRequest::new(RequestMetadata::new(
            session_id,
            CompletionPurpose::CategoryDetection,
        ))
        .with_system_prompt(system_prompt(categories))
        .with_message(MessageRole::User, message)
        .with_max_tokens(150)
        .with_temperature(0.0)
        .json();

        let response = self.ai.complete(request).await?;
        interpret(&response.content, message, categories)
    }
}

fn system_prompt(categories: &CategoryConfigSet) -> String {
    let mut lines = vec![
        "You classify a visitor's legal issue into exactly one of the categories below.".to_string(),
        "Respond with a JSON object: {\"category\": <key or null>, \"sub_category\": <key or null>, \"confidence\": <number 0 to 1>}.".to_string(),
        "Use only the keys listed. If the message does not describe a legal issue, use null.".to_string(),
        String::new(),
        "Categories:".to_string(),
    ];
    for category in categories.iter() {
        let description = category.description.as_deref().unwrap_or("");
        lines.push(format!("- {}: {} {}", category.key, category.name, description).trim_end().to_string());
        for sub in &category.sub_categories {
            lines.push(format!("  - {}: {}", sub.key, sub.name));
        }
    }
    lines.join("\n")
}

/// Turns a classifier response into a detection.
///
/// An unknown category key is a failure, never coerced. An unknown or missing
/// sub-category is re-derived from keywords.
fn interpret(
    content: &str,
    message: &str,
    categories: &CategoryConfigSet,
) -> Result<Detection, DetectionFailure> {
    let object = parse_json_object(content)?;

    let Some(key) = object.get("category").and_then(scalar_as_string) else {
        return Ok(Detection::none());
    };
    let category = categories
        .get(&key)
        .ok_or_else(|| DetectionFailure::UnknownCategory(key.clone()))?;

    let sub_category = object
        .get("sub_category")
        .and_then(scalar_as_string)
        .filter(|s| category.sub_categories.iter().any(|sub| &sub.key == s))
        .or_else(|| match_sub_category(message, category));

    Ok(Detection {
        category: Some(category.key.clone()),
        sub_category,
        confidence: confidence_of(object.get("confidence")),
    })
}

pub(crate) fn confidence_of(value: Option<&Value>) -> Confidence {
    match value {
        Some(Value::Number(n)) => Confidence::from_score(n.as_f64().unwrap_or(0.0)),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "high" => Confidence::High,
            "medium" => Confidence::Medium,
            other => other
                .parse::<f64>()
                .map(Confidence::from_score)
                .unwrap_or(Confidence::Low),
        },
        _ => Confidence::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAIProvider;
    use crate::application::fallback::Strategy;

    const DOC: &str = r#"
categories:
  personal_injury:
    name: Personal Injury
    keywords: [accident, injured, hurt]
    sub_categories:
      - { key: car_accident, name: Car Accident, keywords: [car, truck] }
      - { key: slip_and_fall, name: Slip and Fall, keywords: [slipped, fell] }
    fields:
      first_name: { type: text, required: true, source: user_provided }
    marketplace: { campaign_id: C1, supplier_id: S1, key: K1 }
  family_law:
    name: Family Law
    keywords: [divorce, custody]
    fields:
      first_name: { type: text, required: true, source: user_provided }
    marketplace: { campaign_id: C2, supplier_id: S2, key: K2 }
"#;

    fn set() -> CategoryConfigSet {
        CategoryConfigSet::from_yaml_str(DOC).unwrap()
    }

    fn detector(ai: MockAIProvider) -> CategoryDetector {
        CategoryDetector::new(Arc::new(ai), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn confident_ai_result_is_used() {
        let ai = MockAIProvider::new().with_response(
            r#"{"category": "family_law", "sub_category": null, "confidence": 0.93}"#,
        );
        let resolved = detector(ai).detect(SessionId::new(), "my spouse left", &set()).await;

        assert_eq!(resolved.strategy, Strategy::Primary);
        assert_eq!(resolved.value.category.as_deref(), Some("family_law"));
        assert_eq!(resolved.value.confidence, Confidence::High);
        assert_eq!(resolved.value.sub_category, None);
    }

    #[tokio::test]
    async fn ai_outage_falls_back_to_keywords_at_medium() {
        let resolved = detector(MockAIProvider::unavailable())
            .detect(SessionId::new(), "I was in a car accident and got hurt", &set())
            .await;

        assert_eq!(resolved.strategy, Strategy::Fallback);
        assert_eq!(resolved.value.category.as_deref(), Some("personal_injury"));
        assert_eq!(resolved.value.sub_category.as_deref(), Some("car_accident"));
        assert_eq!(resolved.value.confidence, Confidence::Medium);
    }

    #[tokio::test]
    async fn unknown_key_is_not_coerced() {
        let ai = MockAIProvider::new()
            .with_response(r#"{"category": "tax_law", "confidence": 0.99}"#);
        let resolved = detector(ai).detect(SessionId::new(), "help with divorce", &set()).await;

        assert_eq!(resolved.strategy, Strategy::Fallback);
        assert_eq!(resolved.value.category.as_deref(), Some("family_law"));
    }

    #[tokio::test]
    async fn low_confidence_falls_back() {
        let ai = MockAIProvider::new()
            .with_response(r#"{"category": "personal_injury", "confidence": 0.2}"#);
        let resolved = detector(ai).detect(SessionId::new(), "going through a divorce", &set()).await;

        assert!(resolved.is_fallback());
        assert_eq!(resolved.value.category.as_deref(), Some("family_law"));
    }

    #[tokio::test]
    async fn both_strategies_missing_yields_none() {
        let resolved = detector(MockAIProvider::unavailable())
            .detect(SessionId::new(), "hello there", &set())
            .await;
        assert_eq!(resolved.value, Detection::none());
    }

    #[tokio::test]
    async fn invalid_sub_category_is_rederived() {
        let ai = MockAIProvider::new().with_response(
            "```json\n{\"category\": \"personal_injury\", \"sub_category\": \"boating\", \"confidence\": \"high\"}\n```",
        );
        let resolved = detector(ai).detect(SessionId::new(), "I got hurt", &set()).await;

        assert_eq!(resolved.strategy, Strategy::Primary);
        assert_eq!(resolved.value.sub_category.as_deref(), Some("other"));
    }

    #[test]
    fn prompt_lists_every_key() {
        let prompt = system_prompt(&set());
        assert!(prompt.contains("- personal_injury: Personal Injury"));
        assert!(prompt.contains("  - slip_and_fall: Slip and Fall"));
        assert!(prompt.contains("- family_law: Family Law"));
    }

    #[test]
    fn confidence_accepts_numbers_and_words() {
        assert_eq!(confidence_of(Some(&serde_json::json!(0.85))), Confidence::High);
        assert_eq!(confidence_of(Some(&serde_json::json!("medium"))), Confidence::Medium);
        assert_eq!(confidence_of(Some(&serde_json::json!("0.6"))), Confidence::Medium);
        assert_eq!(confidence_of(None), Confidence::Low);
    }
}
