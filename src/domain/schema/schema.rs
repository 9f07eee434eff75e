//! Per-category validation schema.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use super::ValidationRule;
use crate::domain::category::{CategoryConfig, FieldDefinition, FieldSource};
use crate::domain::extraction::normalize_value;

/// A field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every failing field of a payload, one entry per field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} field(s) failed validation: {}", .0.len(), join_errors(.0))]
pub struct SchemaViolations(pub Vec<FieldError>);

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl SchemaViolations {
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|e| e.field.as_str())
    }
}

/// Compiled rule for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub rule: ValidationRule,
    pub required: bool,
    pub source: FieldSource,
    definition: FieldDefinition,
}

/// Validation schema generated from a category's field definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySchema {
    category: String,
    fields: BTreeMap<String, FieldSchema>,
}

impl CategorySchema {
    /// Compiles every field definition of `category` into a rule.
    pub fn compile(category: &CategoryConfig) -> Self {
        let fields = category
            .fields
            .iter()
            .map(|(name, def)| {
                (
                    name.clone(),
                    FieldSchema {
                        rule: ValidationRule::from_definition(def),
                        required: def.required,
                        source: def.source(),
                        definition: def.clone(),
                    },
                )
            })
            .collect();
        Self {
            category: category.key.clone(),
            fields,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSchema)> {
        self.fields.iter().map(|(n, f)| (n.as_str(), f))
    }

    /// Normalizes and checks a single conversational value.
    ///
    /// Returns the normalized value on success.
    pub fn validate_field(&self, name: &str, value: &str) -> Result<String, FieldError> {
        let schema = self
            .fields
            .get(name)
            .ok_or_else(|| FieldError::new(name, "is not a field of this category"))?;
        let normalized = normalize_value(&schema.definition, value).ok_or_else(|| {
            let message = match schema.rule.check(value) {
                Err(message) => message,
                Ok(()) => schema.rule.expectation(),
            };
            FieldError::new(name, message)
        })?;
        schema
            .rule
            .check(&normalized)
            .map(|_| normalized)
            .map_err(|message| FieldError::new(name, message))
    }

    /// Checks a fully assembled payload against every field rule.
    ///
    /// Missing required fields and invalid present fields each produce one
    /// error; validation does not stop at the first failure. Keys the schema
    /// does not know are dropped from the returned data.
    pub fn validate_submission(
        &self,
        payload: &BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, String>, SchemaViolations> {
        let mut errors = Vec::new();
        let mut data = BTreeMap::new();

        for (name, schema) in &self.fields {
            match payload.get(name).filter(|v| !v.trim().is_empty()) {
                None if schema.required => errors.push(FieldError::new(name, "is required")),
                None => {}
                Some(value) => match schema.rule.check(value) {
                    Ok(()) => {
                        data.insert(name.clone(), value.clone());
                    }
                    Err(message) => errors.push(FieldError::new(name, message)),
                },
            }
        }

        if errors.is_empty() {
            Ok(data)
        } else {
            Err(SchemaViolations(errors))
        }
    }

    /// A payload of sample values for every required field.
    pub fn sample_payload(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .filter(|(_, s)| s.required)
            .map(|(n, s)| (n.clone(), s.rule.sample_value()))
            .collect()
    }
}
