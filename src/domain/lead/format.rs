//! Marketplace output formatting.
//!
//! Values are re-encoded through their parsed form (digits for phones,
//! calendar dates for dates) so formatting an already formatted value is a
//! no-op.

use crate::domain::category::{FieldDefinition, FieldType};
use crate::domain::extraction::{normalize_enum, normalize_phone, normalize_state, parse_date};

/// Phone encodings understood by the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhoneFormat {
    /// `5551234567`
    #[default]
    Digits,
    /// `555-123-4567`
    Dashed,
    /// `(555) 123-4567`
    Parenthesized,
    /// `+15551234567`
    E164,
}

impl PhoneFormat {
    pub fn parse(format: Option<&str>) -> Self {
        match format.map(|f| f.trim().to_ascii_lowercase()).as_deref() {
            Some("dashed") | Some("xxx-xxx-xxxx") => PhoneFormat::Dashed,
            Some("parenthesized") | Some("(xxx) xxx-xxxx") => PhoneFormat::Parenthesized,
            Some("e164") | Some("+1xxxxxxxxxx") => PhoneFormat::E164,
            _ => PhoneFormat::Digits,
        }
    }
}

/// Date encodings understood by the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFormat {
    #[default]
    Iso,
    UsSlash,
    UsDash,
}

impl DateFormat {
    pub fn parse(format: Option<&str>) -> Self {
        match format.map(|f| f.trim().to_ascii_uppercase()).as_deref() {
            Some("MM/DD/YYYY") => DateFormat::UsSlash,
            Some("MM-DD-YYYY") => DateFormat::UsDash,
            _ => DateFormat::Iso,
        }
    }

    fn pattern(&self) -> &'static str {
        match self {
            DateFormat::Iso => "%Y-%m-%d",
            DateFormat::UsSlash => "%m/%d/%Y",
            DateFormat::UsDash => "%m-%d-%Y",
        }
    }
}

pub fn format_phone(value: &str, format: PhoneFormat) -> Option<String> {
    let d = normalize_phone(value)?;
    Some(match format {
        PhoneFormat::Digits => d,
        PhoneFormat::Dashed => format!("{}-{}-{}", &d[..3], &d[3..6], &d[6..]),
        PhoneFormat::Parenthesized => format!("({}) {}-{}", &d[..3], &d[3..6], &d[6..]),
        PhoneFormat::E164 => format!("+1{d}"),
    })
}

pub fn format_date(value: &str, format: DateFormat) -> Option<String> {
    parse_date(value).map(|date| date.format(format.pattern()).to_string())
}

/// Formats a value for the marketplace according to its definition.
///
/// A value that cannot be parsed is returned unchanged so the schema check
/// that follows reports it.
pub fn format_for_marketplace(definition: &FieldDefinition, value: &str) -> String {
    let formatted = match definition.field_type {
        FieldType::Phone => format_phone(value, PhoneFormat::parse(definition.format.as_deref())),
        FieldType::Date => format_date(value, DateFormat::parse(definition.format.as_deref())),
        FieldType::Enum => normalize_enum(value, &definition.allowed_values),
        FieldType::State => normalize_state(value),
        FieldType::Email => Some(value.trim().to_lowercase()),
        _ => Some(value.trim().to_string()),
    };
    formatted.unwrap_or_else(|| value.to_string())
}
