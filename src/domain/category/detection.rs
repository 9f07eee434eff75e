//! Deterministic category and sub-category detection.
//!
//! Keyword matching is the fallback strategy when AI classification fails.
//! It never reports more than medium confidence.

use serde::{Deserialize, Serialize};

use super::{CategoryConfig, CategoryConfigSet};

/// Sub-category assigned when nothing scores high enough.
pub const OTHER_SUB_CATEGORY: &str = "other";

/// Minimum score a sub-category needs to be accepted.
pub const MIN_SUB_CATEGORY_SCORE: u32 = 2;

/// Detection confidence band.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    #[default]
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Collapses a 0.0..=1.0 score into a band.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Confidence::High
        } else if score >= 0.5 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

/// Result of classifying a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub confidence: Confidence,
}

impl Detection {
    /// Nothing detected.
    pub fn none() -> Self {
        Self {
            category: None,
            sub_category: None,
            confidence: Confidence::Low,
        }
    }

    pub fn is_detected(&self) -> bool {
        self.category.is_some()
    }
}

/// Lowercases and replaces punctuation with spaces, padded on both sides so
/// a phrase can be matched on word boundaries with `contains(" phrase ")`.
fn normalize_for_matching(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(' ');
    let mut last_space = true;
    for ch in text.chars() {
        if ch.is_alphanumeric() || ch == '\'' {
            out.extend(ch.to_lowercase());
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    if !last_space {
        out.push(' ');
    }
    out
}

fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    let needle = normalize_for_matching(phrase);
    !needle.trim().is_empty() && haystack.contains(&needle)
}

/// Keyword score of a category against a normalized message.
fn category_score(haystack: &str, category: &CategoryConfig) -> u32 {
    let own = category.keywords.iter();
    let nested = category.sub_categories.iter().flat_map(|s| s.keywords.iter());
    own.chain(nested)
        .filter(|kw| contains_phrase(haystack, kw))
        .count() as u32
}

/// Picks the category whose keyword list best matches the message.
///
/// Ties resolve to the alphabetically first category key, since the set is
/// keyed in sorted order.
pub fn match_category<'a>(message: &str, set: &'a CategoryConfigSet) -> Option<&'a CategoryConfig> {
    let haystack = normalize_for_matching(message);
    let mut best: Option<(&CategoryConfig, u32)> = None;
    for category in set.iter() {
        let score = category_score(&haystack, category);
        if score > 0 && best.map_or(true, |(_, s)| score > s) {
            best = Some((category, score));
        }
    }
    best.map(|(c, _)| c)
}

/// Narrower pass over a category's sub-categories.
///
/// The sub-category key as a phrase scores 2, each keyword 1. Below
/// [`MIN_SUB_CATEGORY_SCORE`] the result is [`OTHER_SUB_CATEGORY`]. A category
/// with no sub-categories yields `None`.
pub fn match_sub_category(message: &str, category: &CategoryConfig) -> Option<String> {
    if category.sub_categories.is_empty() {
        return None;
    }
    let haystack = normalize_for_matching(message);
    let mut best: Option<(&str, u32)> = None;
    for sub in &category.sub_categories {
        let mut score = 0;
        if contains_phrase(&haystack, &sub.key.replace('_', " ")) {
            score += 2;
        }
        score += sub
            .keywords
            .iter()
            .filter(|kw| contains_phrase(&haystack, kw))
            .count() as u32;
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((sub.key.as_str(), score));
        }
    }
    match best {
        Some((key, score)) if score >= MIN_SUB_CATEGORY_SCORE => Some(key.to_string()),
        _ => Some(OTHER_SUB_CATEGORY.to_string()),
    }
}

/// Full keyword detection: category then sub-category, always medium.
pub fn detect_by_keywords(message: &str, set: &CategoryConfigSet) -> Detection {
    match match_category(message, set) {
        Some(category) => Detection {
            category: Some(category.key.clone()),
            sub_category: match_sub_category(message, category),
            confidence: Confidence::Medium,
        },
        None => Detection::none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
categories:
  personal_injury:
    name: Personal Injury
    keywords: [accident, injured, injury, hurt, crash]
    sub_categories:
      - { key: car_accident, name: Car Accident, keywords: [car, vehicle, truck] }
      - { key: slip_and_fall, name: Slip and Fall, keywords: [slipped, fell] }
    fields:
      first_name: { type: text, required: true, source: user_provided }
    marketplace: { campaign_id: C1, supplier_id: S1, key: K1 }
  family_law:
    name: Family Law
    keywords: [divorce, custody, child support]
    fields:
      first_name: { type: text, required: true, source: user_provided }
    marketplace: { campaign_id: C2, supplier_id: S2, key: K2 }
"#;

    fn set() -> CategoryConfigSet {
        CategoryConfigSet::from_yaml_str(DOC).unwrap()
    }

    #[test]
    fn confidence_bands() {
        assert_eq!(Confidence::from_score(0.95), Confidence::High);
        assert_eq!(Confidence::from_score(0.8), Confidence::High);
        assert_eq!(Confidence::from_score(0.6), Confidence::Medium);
        assert_eq!(Confidence::from_score(0.2), Confidence::Low);
    }

    #[test]
    fn ties_go_to_the_alphabetically_first_key() {
        // one keyword each; family_law sorts before personal_injury
        let set = set();
        let category = match_category("I got hurt during the custody handover", &set).unwrap();
        assert_eq!(category.key, "family_law");
    }

    #[test]
    fn keyword_detection_is_medium_confidence() {
        let detection = detect_by_keywords("I was in a car accident and got hurt", &set());
        assert_eq!(detection.category.as_deref(), Some("personal_injury"));
        assert_eq!(detection.sub_category.as_deref(), Some("car_accident"));
        assert_eq!(detection.confidence, Confidence::Medium);
    }

    #[test]
    fn keywords_match_on_word_boundaries() {
        assert!(match_category("we are hurtling along", &set()).is_none());
        assert!(match_category("Divorce!", &set()).is_some());
    }

    #[test]
    fn multi_word_keywords_match() {
        let set = set();
        let c = match_category("I need help with child support", &set).unwrap();
        assert_eq!(c.key, "family_law");
    }

    #[test]
    fn no_match_yields_low_and_no_category() {
        let detection = detect_by_keywords("hello there", &set());
        assert_eq!(detection, Detection::none());
        assert!(!detection.is_detected());
    }

    #[test]
    fn weak_sub_category_defaults_to_other() {
        let set = set();
        let pi = set.get("personal_injury").unwrap();
        // A single keyword hit scores 1, below the threshold.
        assert_eq!(match_sub_category("I fell", pi).as_deref(), Some("other"));
        assert_eq!(
            match_sub_category("I slipped and fell at the store", pi).as_deref(),
            Some("slip_and_fall")
        );
    }

    #[test]
    fn sub_category_key_phrase_scores_two() {
        let set = set();
        let pi = set.get("personal_injury").unwrap();
        assert_eq!(
            match_sub_category("it was a car accident", pi).as_deref(),
            Some("car_accident")
        );
    }

    #[test]
    fn category_without_sub_categories_has_none() {
        let set = set();
        let fl = set.get("family_law").unwrap();
        assert_eq!(match_sub_category("divorce", fl), None);
    }
}
