//! Lead payload assembly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::format_for_marketplace;
use crate::domain::category::{CategoryConfig, FieldSource};
use crate::domain::session::ClientContext;

/// Request-boundary inputs available at submission time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionContext {
    /// IP, user agent and referrer of the confirming request.
    pub client: ClientContext,
    /// Opaque tracking and consent-proof identifiers, passed through as-is.
    pub tracking: BTreeMap<String, String>,
}

impl SubmissionContext {
    pub fn new(client: ClientContext, tracking: BTreeMap<String, String>) -> Self {
        Self { client, tracking }
    }
}

/// The marketplace-ready record, built fresh for every submission attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadPayload {
    fields: BTreeMap<String, String>,
}

impl LeadPayload {
    /// Collects every field value from its declared source.
    ///
    /// Fields without a value are simply absent; the schema decides whether
    /// that is acceptable.
    pub fn assemble(
        category: &CategoryConfig,
        answers: &BTreeMap<String, String>,
        context: &SubmissionContext,
    ) -> Self {
        let mut fields = BTreeMap::new();
        for (name, def) in &category.fields {
            let lookup_key = def.value.as_deref().unwrap_or(name);
            let value = match def.source() {
                FieldSource::UserProvided => answers.get(name).cloned(),
                FieldSource::StaticConfig | FieldSource::ComplianceText => def.value.clone(),
                FieldSource::ServerDerived => {
                    context.client.attribute(lookup_key).map(str::to_string)
                }
                FieldSource::TrackingId => context.tracking.get(lookup_key).cloned(),
            };
            if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
                fields.insert(name.clone(), value);
            }
        }
        Self { fields }
    }

    /// Applies marketplace formatting to every known field.
    pub fn formatted(self, category: &CategoryConfig) -> Self {
        let fields = self
            .fields
            .into_iter()
            .map(|(name, value)| {
                let value = match category.field(&name) {
                    Some(def) => format_for_marketplace(def, &value),
                    None => value,
                };
                (name, value)
            })
            .collect();
        Self { fields }
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn into_fields(self) -> BTreeMap<String, String> {
        self.fields
    }
}

impl From<BTreeMap<String, String>> for LeadPayload {
    fn from(fields: BTreeMap<String, String>) -> Self {
        Self { fields }
    }
}
