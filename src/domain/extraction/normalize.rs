//! Local re-validation of extracted values.
//!
//! Every value, whether from the AI or from pattern matching, passes through
//! here before it can reach a session's answers. A value that does not fit
//! its declared type is dropped (`None`), never coerced into something the
//! user did not say.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::category::{FieldDefinition, FieldType};

/// Literal date formats accepted from users.
pub const ACCEPTED_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y", "%Y/%m/%d"];

/// Default cap for free-text answers.
pub const DEFAULT_TEXT_MAX_LENGTH: usize = 255;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(?:\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("email regex")
});

/// Four-digit year with one- or two-digit month and day. chrono alone would
/// read "03/15/24" as year 24.
static DATE_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\d{4}[-/]\d{1,2}[-/]\d{1,2}|\d{1,2}[-/]\d{1,2}[-/]\d{4})$")
        .expect("date shape regex")
});

const STATES: &[(&str, &str)] = &[
    ("AL", "alabama"), ("AK", "alaska"), ("AZ", "arizona"), ("AR", "arkansas"),
    ("CA", "california"), ("CO", "colorado"), ("CT", "connecticut"), ("DE", "delaware"),
    ("DC", "district of columbia"), ("FL", "florida"), ("GA", "georgia"), ("HI", "hawaii"),
    ("ID", "idaho"), ("IL", "illinois"), ("IN", "indiana"), ("IA", "iowa"),
    ("KS", "kansas"), ("KY", "kentucky"), ("LA", "louisiana"), ("ME", "maine"),
    ("MD", "maryland"), ("MA", "massachusetts"), ("MI", "michigan"), ("MN", "minnesota"),
    ("MS", "mississippi"), ("MO", "missouri"), ("MT", "montana"), ("NE", "nebraska"),
    ("NV", "nevada"), ("NH", "new hampshire"), ("NJ", "new jersey"), ("NM", "new mexico"),
    ("NY", "new york"), ("NC", "north carolina"), ("ND", "north dakota"), ("OH", "ohio"),
    ("OK", "oklahoma"), ("OR", "oregon"), ("PA", "pennsylvania"), ("RI", "rhode island"),
    ("SC", "south carolina"), ("SD", "south dakota"), ("TN", "tennessee"), ("TX", "texas"),
    ("UT", "utah"), ("VT", "vermont"), ("VA", "virginia"), ("WA", "washington"),
    ("WV", "west virginia"), ("WI", "wisconsin"), ("WY", "wyoming"), ("PR", "puerto rico"),
];

fn digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Lowercased address with an `@` and a dotted domain.
pub fn normalize_email(raw: &str) -> Option<String> {
    let candidate = raw.trim().trim_end_matches('.').to_lowercase();
    EMAIL.is_match(&candidate).then_some(candidate)
}

/// Ten-digit phone number; a leading country code `1` is dropped.
pub fn normalize_phone(raw: &str) -> Option<String> {
    if raw.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let d = digits(raw);
    match d.len() {
        10 => Some(d),
        11 if d.starts_with('1') => Some(d[1..].to_string()),
        _ => None,
    }
}

/// Five-digit ZIP, or ZIP+4 as `12345-6789`.
pub fn normalize_zip(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.chars().any(|c| !(c.is_ascii_digit() || c == '-' || c == ' ')) {
        return None;
    }
    let d = digits(trimmed);
    match d.len() {
        5 => Some(d),
        9 => Some(format!("{}-{}", &d[..5], &d[5..])),
        _ => None,
    }
}

/// Two-letter uppercase state code; full state names are mapped.
pub fn normalize_state(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('.');
    if trimmed.len() == 2 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        let code = trimmed.to_ascii_uppercase();
        return STATES.iter().any(|(c, _)| *c == code).then_some(code);
    }
    let lowered = trimmed.to_lowercase();
    STATES
        .iter()
        .find(|(_, name)| *name == lowered)
        .map(|(code, _)| code.to_string())
}

/// The allowed value matching case-insensitively, in its canonical case.
pub fn normalize_enum(raw: &str, allowed: &[String]) -> Option<String> {
    let trimmed = raw.trim();
    allowed
        .iter()
        .find(|v| v.eq_ignore_ascii_case(trimmed))
        .cloned()
}

/// Parses a date in one of the accepted formats.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if !DATE_SHAPE.is_match(trimmed) {
        return None;
    }
    ACCEPTED_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

/// The date as given, if it is a real date in an accepted format.
pub fn normalize_date(raw: &str) -> Option<String> {
    parse_date(raw).map(|_| raw.trim().to_string())
}

/// Whitespace-collapsed, non-empty text within `max_length` characters.
pub fn normalize_text(raw: &str, max_length: usize) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() || collapsed.chars().count() > max_length {
        return None;
    }
    Some(collapsed)
}

/// Integer, with thousands separators tolerated.
pub fn normalize_numeric(raw: &str) -> Option<String> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    cleaned.parse::<i64>().ok().map(|n| n.to_string())
}

/// Normalizes a raw value according to its field definition.
pub fn normalize_value(definition: &FieldDefinition, raw: &str) -> Option<String> {
    match definition.field_type {
        FieldType::Text => normalize_text(
            raw,
            definition.max_length.unwrap_or(DEFAULT_TEXT_MAX_LENGTH),
        ),
        FieldType::Email => normalize_email(raw),
        FieldType::Phone => normalize_phone(raw),
        FieldType::ZipCode => normalize_zip(raw),
        FieldType::State => normalize_state(raw),
        FieldType::Date => normalize_date(raw),
        FieldType::Enum => normalize_enum(raw, &definition.allowed_values),
        FieldType::Numeric => normalize_numeric(raw),
    }
}
