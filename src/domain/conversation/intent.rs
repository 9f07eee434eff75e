//! Confirmation intent of a reply to the summary prompt.

/// What the user meant when answering "shall I submit?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Affirm,
    Decline,
    /// Neither; treated as a correction or a question.
    Other,
}

const DECLINE_SIGNALS: &[&str] = &[
    "no", "nope", "nah", "not", "don't", "dont", "cancel", "stop", "wait", "never", "hold",
];

const DECLINE_PHRASES: &[&str] = &["not yet", "hold on", "do not"];

const AFFIRM_SIGNALS: &[&str] = &[
    "yes", "y", "yeah", "yep", "yup", "sure", "ok", "okay", "correct", "confirm", "confirmed",
    "submit", "send", "absolutely", "definitely", "please", "perfect", "right",
];

const AFFIRM_PHRASES: &[&str] = &["go ahead", "looks good", "that's right", "sounds good"];

/// Phrases that introduce a replacement value.
const DATA_PHRASES: &[&str] = &[
    "my name is", "my email", "my phone", "my number", "my zip", "my address", "should be",
];

/// Words that mean the reply carries new information.
const CORRECTION_SIGNALS: &[&str] = &["change", "wrong", "actually", "update", "fix", "instead"];

fn tokens(lower: &str) -> Vec<&str> {
    lower
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Classifies a reply. A reply carrying a value (an address, digits, "my zip
/// is ...") is a correction even when it opens with "no". Otherwise negative
/// signals are checked first so "no, don't submit" never reads as a
/// confirmation, and "actually ..." without a value is still a correction.
pub fn classify(message: &str) -> Intent {
    let lower = message.trim().to_lowercase();
    let words = tokens(&lower);
    let has_word = |list: &[&str]| words.iter().any(|w| list.contains(w));
    let has_phrase = |list: &[&str]| list.iter().any(|p| lower.contains(p));

    let carries_value = lower.contains('@')
        || lower.chars().any(|c| c.is_ascii_digit())
        || has_phrase(DATA_PHRASES);
    if carries_value {
        return Intent::Other;
    }

    if has_word(DECLINE_SIGNALS) || has_phrase(DECLINE_PHRASES) {
        return Intent::Decline;
    }

    if has_word(CORRECTION_SIGNALS) {
        return Intent::Other;
    }

    if has_word(AFFIRM_SIGNALS) || has_phrase(AFFIRM_PHRASES) {
        Intent::Affirm
    } else {
        Intent::Other
    }
}
