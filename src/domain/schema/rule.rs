//! Validation rules compiled from field definitions.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::category::{FieldDefinition, FieldType};
use crate::domain::extraction::{normalize_email, parse_date, DEFAULT_TEXT_MAX_LENGTH};

/// Phone spellings a marketplace payload may carry.
static PHONE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^\d{10}$",
        r"^1\d{10}$",
        r"^\d{3}-\d{3}-\d{4}$",
        r"^\d{3}\.\d{3}\.\d{4}$",
        r"^\(\d{3}\) ?\d{3}-\d{4}$",
        r"^\+1\d{10}$",
        r"^\+1[ \-]\d{3}[ \-]\d{3}[ \-]\d{4}$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("phone pattern"))
    .collect()
});

static ZIP_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{5}(?:-?\d{4})?$").expect("zip pattern"));

static STATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2}$").expect("state pattern"));

/// One rule kind per field type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationRule {
    Text { max_length: usize },
    Email,
    Phone,
    ZipCode,
    State,
    Date,
    Enum { allowed: Vec<String> },
    Numeric,
}

impl ValidationRule {
    /// Maps a field definition to its rule.
    pub fn from_definition(definition: &FieldDefinition) -> Self {
        match definition.field_type {
            FieldType::Text => ValidationRule::Text {
                max_length: definition.max_length.unwrap_or(DEFAULT_TEXT_MAX_LENGTH),
            },
            FieldType::Email => ValidationRule::Email,
            FieldType::Phone => ValidationRule::Phone,
            FieldType::ZipCode => ValidationRule::ZipCode,
            FieldType::State => ValidationRule::State,
            FieldType::Date => ValidationRule::Date,
            FieldType::Enum => ValidationRule::Enum {
                allowed: definition.allowed_values.clone(),
            },
            FieldType::Numeric => ValidationRule::Numeric,
        }
    }

    /// Checks a value exactly as given; returns a human message on failure.
    pub fn check(&self, value: &str) -> Result<(), String> {
        let ok = match self {
            ValidationRule::Text { max_length } => {
                let trimmed = value.trim();
                if trimmed.chars().count() > *max_length {
                    return Err(format!("must be at most {max_length} characters"));
                }
                !trimmed.is_empty()
            }
            ValidationRule::Email => normalize_email(value).is_some(),
            ValidationRule::Phone => PHONE_PATTERNS.iter().any(|p| p.is_match(value)),
            ValidationRule::ZipCode => ZIP_PATTERN.is_match(value),
            ValidationRule::State => STATE_PATTERN.is_match(value),
            ValidationRule::Date => parse_date(value).is_some(),
            ValidationRule::Enum { allowed } => allowed.iter().any(|a| a == value),
            ValidationRule::Numeric => value.trim().parse::<i64>().is_ok(),
        };
        if ok {
            Ok(())
        } else {
            Err(self.expectation())
        }
    }

    /// What a valid value looks like.
    pub fn expectation(&self) -> String {
        match self {
            ValidationRule::Text { .. } => "must not be empty".to_string(),
            ValidationRule::Email => "must be a valid email address".to_string(),
            ValidationRule::Phone => "must be a 10-digit phone number".to_string(),
            ValidationRule::ZipCode => "must be a 5 or 9 digit ZIP code".to_string(),
            ValidationRule::State => "must be a 2-letter state code".to_string(),
            ValidationRule::Date => "must be a date like YYYY-MM-DD or MM/DD/YYYY".to_string(),
            ValidationRule::Enum { allowed } => format!("must be one of: {}", allowed.join(", ")),
            ValidationRule::Numeric => "must be a whole number".to_string(),
        }
    }

    /// A canonical value that satisfies this rule.
    pub fn sample_value(&self) -> String {
        match self {
            ValidationRule::Text { max_length } => "Sample".chars().take(*max_length).collect(),
            ValidationRule::Email => "sample@example.com".to_string(),
            ValidationRule::Phone => "5555550123".to_string(),
            ValidationRule::ZipCode => "90210".to_string(),
            ValidationRule::State => "CA".to_string(),
            ValidationRule::Date => "2024-01-15".to_string(),
            ValidationRule::Enum { allowed } => allowed.first().cloned().unwrap_or_default(),
            ValidationRule::Numeric => "1".to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ValidationRule::Text { .. } => "text",
            ValidationRule::Email => "email",
            ValidationRule::Phone => "phone",
            ValidationRule::ZipCode => "zip_code",
            ValidationRule::State => "state",
            ValidationRule::Date => "date",
            ValidationRule::Enum { .. } => "enum",
            ValidationRule::Numeric => "numeric",
        }
    }
}
