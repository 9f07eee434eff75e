//! Extraction module - turning free text into typed field values.

mod normalize;
mod patterns;
mod response_parser;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::category::Confidence;

pub use normalize::{
    normalize_date, normalize_email, normalize_enum, normalize_numeric, normalize_phone,
    normalize_state, normalize_text, normalize_value, normalize_zip, parse_date,
    ACCEPTED_DATE_FORMATS, DEFAULT_TEXT_MAX_LENGTH,
};
pub use patterns::PatternExtractor;
pub use response_parser::{parse_json_object, scalar_as_string, ResponseParseError};

/// Values extracted from one message. An empty map is a miss, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    pub fields: BTreeMap<String, String>,
    pub confidence: Confidence,
}

impl Extraction {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
