//! Deterministic pattern extraction.
//!
//! Used whenever the AI extraction call fails. Recognizes explicit name
//! statements, email addresses, phone numbers and ZIP codes anywhere in the
//! message, and treats a bare reply as the answer to the field that was just
//! asked for. Every hit is re-validated by [`normalize_value`].

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::normalize::normalize_value;
use super::Extraction;
use crate::domain::category::{Confidence, FieldDefinition, FieldType};

// =============================================================================
// Static patterns
// =============================================================================

static NAME_STATEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:my\s+name\s+is|my\s+name's|i'm\s+called|name\s*:)\s*([a-z][a-z'\-]*)(?:\s+([a-z][a-z'\-]*))?")
        .expect("name regex")
});

static EMAIL_IN_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(?:\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}")
        .expect("email regex")
});

static PHONE_IN_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+?1[\s.\-]?)?\(?\b\d{3}\)?[\s.\-]?\d{3}[\s.\-]?\d{4}\b").expect("phone regex")
});

static ZIP_IN_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{5}(?:-\d{4})?\b").expect("zip regex"));

/// Words that end a name capture or cannot be a name on their own.
const NOT_NAMES: &[&str] = &[
    "and", "but", "i", "im", "i'm", "from", "at", "in", "my", "is", "the", "yes", "no", "ok",
    "okay", "hi", "hello", "hey", "sure", "thanks", "what", "why", "how", "not",
];

const FIRST_NAME: &str = "first_name";
const LAST_NAME: &str = "last_name";

fn is_not_name(word: &str) -> bool {
    NOT_NAMES.contains(&word.to_lowercase().as_str())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Rule-based extractor for the fields a turn is trying to fill.
#[derive(Debug, Clone, Default)]
pub struct PatternExtractor;

impl PatternExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extracts values for `fields` from `message`.
    ///
    /// `awaiting` is the field the previous prompt asked for; a bare reply is
    /// tried against it last.
    pub fn extract(
        &self,
        message: &str,
        fields: &[(&str, &FieldDefinition)],
        awaiting: Option<&str>,
    ) -> Extraction {
        let wants = |name: &str| fields.iter().find(|(n, _)| *n == name).map(|(_, d)| *d);
        let first_of_type = |ty: FieldType| fields.iter().find(|(_, d)| d.field_type == ty);

        let mut found: BTreeMap<String, String> = BTreeMap::new();
        let mut explicit = false;
        let accept = |found: &mut BTreeMap<String, String>, name: &str, raw: &str| -> bool {
            match wants(name).and_then(|def| normalize_value(def, raw)) {
                Some(value) => {
                    found.entry(name.to_string()).or_insert(value);
                    true
                }
                None => false,
            }
        };

        // Names
        if wants(FIRST_NAME).is_some() || wants(LAST_NAME).is_some() {
            if let Some((first, last)) = self.extract_name(message) {
                explicit |= accept(&mut found, FIRST_NAME, &first);
                if let Some(last) = last {
                    explicit |= accept(&mut found, LAST_NAME, &last);
                }
            } else if let Some(words) = bare_name(message) {
                match awaiting {
                    Some(FIRST_NAME) => {
                        accept(&mut found, FIRST_NAME, &words[0]);
                        if words.len() > 1 {
                            accept(&mut found, LAST_NAME, &words[words.len() - 1]);
                        }
                    }
                    Some(LAST_NAME) => {
                        accept(&mut found, LAST_NAME, &words[words.len() - 1]);
                    }
                    _ => {}
                }
            }
        }

        if let Some((name, _)) = first_of_type(FieldType::Email) {
            if let Some(email) = self.extract_email(message) {
                explicit |= accept(&mut found, *name, &email);
            }
        }

        if let Some((name, _)) = first_of_type(FieldType::Phone) {
            if let Some(phone) = self.extract_phone(message) {
                explicit |= accept(&mut found, *name, &phone);
            }
        }

        if let Some((name, _)) = first_of_type(FieldType::ZipCode) {
            if let Some(zip) = self.extract_zip(message) {
                explicit |= accept(&mut found, *name, &zip);
            }
        }

        // Direct answer to the awaited field
        if let Some(field) = awaiting {
            if !found.contains_key(field) && field != FIRST_NAME && field != LAST_NAME {
                if let Some(def) = wants(field) {
                    if let Some(value) = direct_answer(def, message) {
                        found.insert(field.to_string(), value);
                    }
                }
            }
        }

        let confidence = if explicit {
            Confidence::Medium
        } else {
            Confidence::Low
        };
        Extraction {
            fields: found,
            confidence,
        }
    }

    /// `(first, last?)` from an explicit "my name is ..." statement.
    pub fn extract_name(&self, message: &str) -> Option<(String, Option<String>)> {
        let caps = NAME_STATEMENT.captures(message)?;
        let first = caps.get(1)?.as_str();
        if is_not_name(first) {
            return None;
        }
        let last = caps
            .get(2)
            .map(|m| m.as_str())
            .filter(|w| !is_not_name(w))
            .map(capitalize);
        Some((capitalize(first), last))
    }

    pub fn extract_email(&self, message: &str) -> Option<String> {
        EMAIL_IN_TEXT.find(message).map(|m| m.as_str().to_string())
    }

    pub fn extract_phone(&self, message: &str) -> Option<String> {
        PHONE_IN_TEXT.find(message).map(|m| m.as_str().to_string())
    }

    pub fn extract_zip(&self, message: &str) -> Option<String> {
        ZIP_IN_TEXT.find(message).map(|m| m.as_str().to_string())
    }
}

/// One to three alphabetic words, read as a name reply.
fn bare_name(message: &str) -> Option<Vec<String>> {
    let trimmed = message.trim().trim_end_matches(['.', '!', ',']);
    let words: Vec<&str> = trimmed.split_whitespace().collect();
    if words.is_empty() || words.len() > 3 {
        return None;
    }
    let valid = words.iter().all(|w| {
        w.chars().all(|c| c.is_alphabetic() || c == '\'' || c == '-') && !is_not_name(w)
    });
    valid.then(|| words.into_iter().map(capitalize).collect())
}

/// A bare reply interpreted as the value of `def`.
fn direct_answer(def: &FieldDefinition, message: &str) -> Option<String> {
    let trimmed = message.trim().trim_end_matches(['.', '!']);
    if let Some(value) = normalize_value(def, trimmed) {
        return Some(value);
    }
    // Enum values mentioned inside a longer reply ("it was yes, I was treated")
    if def.field_type == FieldType::Enum {
        let spaced: String = trimmed
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect();
        let lowered = format!(" {} ", spaced.to_lowercase());
        let mut hits = def
            .allowed_values
            .iter()
            .filter(|v| lowered.contains(&format!(" {} ", v.to_lowercase())));
        let hit = hits.next()?;
        return hits.next().is_none().then(|| hit.clone());
    }
    None
}
