//! Category configuration model.
//!
//! One [`CategoryConfig`] per domain category (personal injury, family law,
//! ...) describes which fields a lead needs, where each value comes from, the
//! order in which missing fields are asked, and the marketplace routing
//! triple. The whole document is a [`CategoryConfigSet`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::CatalogError;

/// Declared type of a lead field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Email,
    Phone,
    #[serde(alias = "zip", alias = "postal_code")]
    ZipCode,
    State,
    Date,
    Enum,
    #[serde(alias = "number", alias = "integer")]
    Numeric,
}

/// Provenance of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    /// Solicited from, and extracted out of, the conversation.
    UserProvided,
    /// Literal from the category document.
    StaticConfig,
    /// Taken from the inbound request (IP, user agent, referrer).
    ServerDerived,
    /// Opaque tracking identifier supplied at submission time.
    TrackingId,
    /// Consent wording or similar compliance literal.
    ComplianceText,
}

impl FieldSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldSource::UserProvided => "user_provided",
            FieldSource::StaticConfig => "static_config",
            FieldSource::ServerDerived => "server_derived",
            FieldSource::TrackingId => "tracking_id",
            FieldSource::ComplianceText => "compliance_text",
        }
    }
}

/// Definition of one lead field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub source: Option<FieldSource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,
    /// Marketplace output format (phone and date fields).
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub max_length: Option<usize>,
    /// Literal, request attribute or tracking input name, depending on source.
    #[serde(default)]
    pub value: Option<String>,
    /// Human label used in prompts and summaries.
    #[serde(default)]
    pub label: Option<String>,
}

impl FieldDefinition {
    pub fn new(field_type: FieldType, source: FieldSource) -> Self {
        Self {
            field_type,
            required: false,
            source: Some(source),
            allowed_values: Vec::new(),
            format: None,
            max_length: None,
            value: None,
            label: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Source, treating an undeclared one as user-provided.
    ///
    /// Structural validation rejects undeclared sources, so after loading
    /// this is always the declared value.
    pub fn source(&self) -> FieldSource {
        self.source.unwrap_or(FieldSource::UserProvided)
    }

    pub fn is_user_provided(&self) -> bool {
        self.source() == FieldSource::UserProvided
    }
}

/// A narrower classification within a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCategory {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// One entry of the conversation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationStep {
    pub order: u32,
    pub field: String,
    /// Prompt template; placeholders are resolved against the answers.
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Marketplace routing triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceRouting {
    pub campaign_id: String,
    pub supplier_id: String,
    pub key: String,
}

/// Static configuration of one domain category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Filled from the document's map key on load.
    #[serde(default, skip_serializing)]
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub sub_categories: Vec<SubCategory>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldDefinition>,
    #[serde(default)]
    pub conversation_order: Vec<ConversationStep>,
    #[serde(default)]
    pub marketplace: Option<MarketplaceRouting>,
}

impl CategoryConfig {
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.get(name)
    }

    /// User-provided field definitions, by name.
    pub fn user_fields(&self) -> impl Iterator<Item = (&str, &FieldDefinition)> {
        self.fields
            .iter()
            .filter(|(_, def)| def.is_user_provided())
            .map(|(name, def)| (name.as_str(), def))
    }

    /// Conversation order sorted by `order`; ties keep document order.
    pub fn ordered_steps(&self) -> Vec<&ConversationStep> {
        let mut steps: Vec<&ConversationStep> = self.conversation_order.iter().collect();
        steps.sort_by_key(|s| s.order);
        steps
    }

    /// Required user-provided fields not yet answered.
    ///
    /// Ordered by the conversation order first, then any required field the
    /// order does not mention, alphabetically.
    pub fn missing_required_fields(&self, answers: &BTreeMap<String, String>) -> Vec<String> {
        let is_missing = |name: &str| {
            self.fields
                .get(name)
                .map(|def| def.required && def.is_user_provided())
                .unwrap_or(false)
                && answers.get(name).map_or(true, |v| v.trim().is_empty())
        };

        let mut missing: Vec<String> = Vec::new();
        for step in self.ordered_steps() {
            if is_missing(&step.field) && !missing.contains(&step.field) {
                missing.push(step.field.clone());
            }
        }
        for (name, _) in self.user_fields() {
            if is_missing(name) && !missing.iter().any(|m| m == name) {
                missing.push(name.to_string());
            }
        }
        missing
    }

    /// The configured prompt template for a field, if any.
    pub fn prompt_for(&self, field: &str) -> Option<&str> {
        self.conversation_order
            .iter()
            .find(|s| s.field == field)
            .and_then(|s| s.prompt.as_deref())
    }

    /// Display label for a field.
    pub fn label_for(&self, field: &str) -> String {
        self.fields
            .get(field)
            .and_then(|d| d.label.clone())
            .unwrap_or_else(|| field.replace('_', " "))
    }

    /// Structural violations of this category, empty when valid.
    pub fn violations(&self) -> Vec<String> {
        let key = &self.key;
        let mut out = Vec::new();

        if self.name.trim().is_empty() {
            out.push(format!("category '{key}' has no name"));
        }

        match &self.marketplace {
            None => out.push(format!("category '{key}' has no marketplace routing")),
            Some(routing) => {
                for (part, value) in [
                    ("campaign_id", &routing.campaign_id),
                    ("supplier_id", &routing.supplier_id),
                    ("key", &routing.key),
                ] {
                    if value.trim().is_empty() {
                        out.push(format!("category '{key}' marketplace {part} is empty"));
                    }
                }
            }
        }

        if self.fields.is_empty() {
            out.push(format!("category '{key}' has no field definitions"));
        }

        for (name, def) in &self.fields {
            if def.source.is_none() {
                out.push(format!("category '{key}' field '{name}' has no source"));
            }
            if def.field_type == FieldType::Enum && def.allowed_values.is_empty() {
                out.push(format!(
                    "category '{key}' enum field '{name}' has no allowed_values"
                ));
            }
            if matches!(
                def.source,
                Some(FieldSource::StaticConfig) | Some(FieldSource::ComplianceText)
            ) && def.value.as_deref().map_or(true, |v| v.trim().is_empty())
            {
                out.push(format!(
                    "category '{key}' field '{name}' is {} but has no value",
                    def.source().as_str()
                ));
            }
        }

        let mut seen = BTreeSet::new();
        for step in &self.conversation_order {
            match self.fields.get(&step.field) {
                None => out.push(format!(
                    "category '{key}' conversation order references unknown field '{}'",
                    step.field
                )),
                Some(def) if !def.is_user_provided() => out.push(format!(
                    "category '{key}' conversation order field '{}' is not user-provided",
                    step.field
                )),
                Some(_) => {}
            }
            if !seen.insert(step.field.as_str()) {
                out.push(format!(
                    "category '{key}' conversation order lists '{}' twice",
                    step.field
                ));
            }
        }

        out
    }
}

/// The complete category document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryConfigSet {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub categories: BTreeMap<String, CategoryConfig>,
}

impl CategoryConfigSet {
    /// Parses and validates a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let mut set: CategoryConfigSet =
            serde_yaml::from_str(yaml).map_err(|e| CatalogError::Parse(e.to_string()))?;
        set.assign_keys();
        set.validate()?;
        Ok(set)
    }

    /// Builds a set from already-constructed categories and validates it.
    pub fn from_categories<I>(categories: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = CategoryConfig>,
    {
        let set = CategoryConfigSet {
            version: None,
            categories: categories
                .into_iter()
                .map(|c| (c.key.clone(), c))
                .collect(),
        };
        set.validate()?;
        Ok(set)
    }

    fn assign_keys(&mut self) {
        for (key, category) in self.categories.iter_mut() {
            category.key = key.clone();
        }
    }

    /// Checks every structural invariant, reporting all violations at once.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut violations = Vec::new();
        if self.categories.is_empty() {
            violations.push("document defines no categories".to_string());
        }
        for category in self.categories.values() {
            violations.extend(category.violations());
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(CatalogError::Invalid(violations))
        }
    }

    pub fn get(&self, key: &str) -> Option<&CategoryConfig> {
        self.categories.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.categories.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryConfig> {
        self.categories.values()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
