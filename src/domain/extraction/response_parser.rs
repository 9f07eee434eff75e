//! Defensive parsing of AI completion output.
//!
//! The completion service is asked for a JSON object but is not guaranteed
//! to return one. Responses are sanitized, stripped of comment-like text and
//! markdown fences, and the first balanced object is parsed. Anything else
//! is rejected rather than guessed at.

use serde_json::{Map, Value};
use thiserror::Error;

/// Maximum accepted response length (32KB).
pub const MAX_RESPONSE_LENGTH: usize = 32_000;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResponseParseError {
    #[error("response is empty")]
    Empty,

    #[error("response too long: {actual} bytes exceeds maximum of {max} bytes")]
    TooLong { max: usize, actual: usize },

    #[error("response contains no JSON object")]
    NoObject,

    #[error("malformed JSON: {0}")]
    Malformed(String),
}

/// Parses the first JSON object in an AI response.
///
/// # Steps
/// 1. Validate length
/// 2. Remove control characters
/// 3. Prefer the contents of a fenced code block
/// 4. Strip `//` and `/* */` comments outside string literals
/// 5. Extract and parse the first balanced `{...}`
pub fn parse_json_object(response: &str) -> Result<Map<String, Value>, ResponseParseError> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return Err(ResponseParseError::Empty);
    }
    if trimmed.len() > MAX_RESPONSE_LENGTH {
        return Err(ResponseParseError::TooLong {
            max: MAX_RESPONSE_LENGTH,
            actual: trimmed.len(),
        });
    }

    let cleaned = remove_control_chars(trimmed);
    let body = extract_from_code_block(&cleaned).unwrap_or(cleaned.as_str());
    let uncommented = strip_comments(body);

    let start = uncommented.find('{').ok_or(ResponseParseError::NoObject)?;
    let json = extract_balanced_object(&uncommented, start).ok_or(ResponseParseError::NoObject)?;

    match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ResponseParseError::NoObject),
        Err(e) => Err(ResponseParseError::Malformed(e.to_string())),
    }
}

/// Reads a string-ish scalar out of a parsed object.
///
/// Numbers are rendered as text; null, empty strings and nested values are
/// treated as absent. Values are stripped of markup but never shortened;
/// the field's own length limit decides whether they are kept.
pub fn scalar_as_string(value: &Value) -> Option<String> {
    let raw = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let clean = strip_html_tags(&raw);
    let clean = clean.trim();
    if clean.is_empty() || clean.eq_ignore_ascii_case("null") || clean.eq_ignore_ascii_case("n/a") {
        return None;
    }
    Some(clean.to_string())
}

fn remove_control_chars(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t' || *c == '\r')
        .collect()
}

fn extract_from_code_block(s: &str) -> Option<&str> {
    let patterns = ["```json\n", "```json\r\n", "```\n", "```\r\n"];
    for pattern in patterns {
        if let Some(start) = s.find(pattern) {
            let body_start = start + pattern.len();
            if let Some(end) = s[body_start..].find("```") {
                return Some(s[body_start..body_start + end].trim());
            }
        }
    }
    None
}

fn strip_comments(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    let mut in_string = false;
    let mut escape_next = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escape_next {
                escape_next = false;
            } else if c == '\\' {
                escape_next = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        let next = chars.peek().copied();
        match (c, next) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            _ => out.push(c),
        }
    }
    out
}

fn extract_balanced_object(s: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in s[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&s[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn strip_html_tags(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }
    result
}
