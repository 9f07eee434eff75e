//! Prompt rendering.
//!
//! Templates support a closed set of placeholders resolved by plain string
//! replacement: `{first_name}`, `{last_name}`, `{name_prefix}` and
//! `{category}`.

use std::collections::BTreeMap;

use crate::domain::category::{CategoryConfig, CategoryConfigSet, FieldType};

/// Prefix used when a field is asked for a second time.
pub const REASK_PREFIX: &str = "Sorry, I didn't quite catch that. ";

/// Resolves the supported placeholders against the answers.
pub fn render_template(
    template: &str,
    answers: &BTreeMap<String, String>,
    category_name: &str,
) -> String {
    let first_name = answers.get("first_name").map(String::as_str).unwrap_or("");
    let last_name = answers.get("last_name").map(String::as_str).unwrap_or("");
    let name_prefix = if first_name.is_empty() {
        String::new()
    } else {
        format!("{first_name}, ")
    };

    let rendered = template
        .replace("{name_prefix}", &name_prefix)
        .replace("{first_name}", first_name)
        .replace("{last_name}", last_name)
        .replace("{category}", category_name);
    capitalize_first(rendered.trim())
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The question for `field`, from its configured template or a default.
pub fn field_prompt(
    category: &CategoryConfig,
    field: &str,
    answers: &BTreeMap<String, String>,
    asked_before: bool,
) -> String {
    let template = match category.prompt_for(field) {
        Some(template) => template.to_string(),
        None => default_template(category, field),
    };
    let prompt = render_template(&template, answers, &category.name);
    if asked_before {
        format!("{REASK_PREFIX}{prompt}")
    } else {
        prompt
    }
}

fn default_template(category: &CategoryConfig, field: &str) -> String {
    let label = category.label_for(field);
    match category.field(field) {
        Some(def) if def.field_type == FieldType::Enum => format!(
            "{{name_prefix}}what is your {label}? ({})",
            def.allowed_values.join(", ")
        ),
        Some(def) if def.field_type == FieldType::Date => {
            format!("{{name_prefix}}what is the {label}? (MM/DD/YYYY)")
        }
        _ => format!("{{name_prefix}}what is your {label}?"),
    }
}

/// Summary of the collected answers with a request for consent to submit.
pub fn summary_prompt(category: &CategoryConfig, answers: &BTreeMap<String, String>) -> String {
    let mut order: Vec<&str> = category
        .ordered_steps()
        .into_iter()
        .map(|s| s.field.as_str())
        .collect();
    for (name, _) in category.user_fields() {
        if !order.contains(&name) {
            order.push(name);
        }
    }

    let mut lines = Vec::new();
    for name in order {
        if let Some(value) = answers.get(name) {
            lines.push(format!("- {}: {}", capitalize_first(&category.label_for(name)), value));
        }
    }

    let header = render_template(
        "Thanks {first_name}! Here is what I have for your {category} inquiry:",
        answers,
        &category.name,
    )
    .replace("Thanks !", "Thanks!");
    format!(
        "{header}\n{}\nShall I send this to an attorney who can help? (yes/no)",
        lines.join("\n")
    )
}

/// Open question asked when the category could not be determined.
pub fn clarifying_prompt(categories: &CategoryConfigSet) -> String {
    let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
    if names.is_empty() {
        return "Could you tell me a little more about your legal issue?".to_string();
    }
    format!(
        "Could you tell me a little more about your legal issue? For example, is it about {}?",
        join_or(&names)
    )
}

fn join_or(items: &[&str]) -> String {
    match items {
        [] => String::new(),
        [one] => one.to_string(),
        [init @ .., last] => format!("{} or {}", init.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
categories:
  personal_injury:
    name: Personal Injury
    fields:
      first_name: { type: text, required: true, source: user_provided, label: first name }
      email: { type: email, required: true, source: user_provided, label: email address }
      injury_severity: { type: enum, required: true, source: user_provided, allowed_values: [Minor, Serious] }
    conversation_order:
      - { order: 1, field: first_name, prompt: "I'm sorry to hear that. What's your first name?" }
      - { order: 2, field: email, prompt: "{name_prefix}what's the best email to reach you?" }
    marketplace: { campaign_id: C, supplier_id: S, key: K }
  family_law:
    name: Family Law
    fields:
      first_name: { type: text, required: true, source: user_provided }
    marketplace: { campaign_id: C, supplier_id: S, key: K }
"#;

    fn set() -> CategoryConfigSet {
        CategoryConfigSet::from_yaml_str(DOC).unwrap()
    }

    fn answers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn name_prefix_substitution() {
        let set = set();
        let pi = set.get("personal_injury").unwrap();
        assert_eq!(
            field_prompt(pi, "email", &answers(&[("first_name", "John")]), false),
            "John, what's the best email to reach you?"
        );
        assert_eq!(
            field_prompt(pi, "email", &BTreeMap::new(), false),
            "What's the best email to reach you?"
        );
    }

    #[test]
    fn reask_is_prefixed() {
        let set = set();
        let pi = set.get("personal_injury").unwrap();
        let prompt = field_prompt(pi, "first_name", &BTreeMap::new(), true);
        assert!(prompt.starts_with(REASK_PREFIX));
        assert!(prompt.ends_with("What's your first name?"));
    }

    #[test]
    fn default_enum_prompt_lists_options() {
        let set = set();
        let pi = set.get("personal_injury").unwrap();
        assert_eq!(
            field_prompt(pi, "injury_severity", &BTreeMap::new(), false),
            "What is your injury severity? (Minor, Serious)"
        );
    }

    #[test]
    fn summary_lists_answers_in_conversation_order() {
        let set = set();
        let pi = set.get("personal_injury").unwrap();
        let summary = summary_prompt(
            pi,
            &answers(&[
                ("email", "john@example.com"),
                ("first_name", "John"),
                ("injury_severity", "Minor"),
            ]),
        );
        let expected = "Thanks John! Here is what I have for your Personal Injury inquiry:\n\
                        - First name: John\n\
                        - Email address: john@example.com\n\
                        - Injury severity: Minor\n\
                        Shall I send this to an attorney who can help? (yes/no)";
        assert_eq!(summary, expected);
    }

    #[test]
    fn clarifying_prompt_names_categories() {
        assert_eq!(
            clarifying_prompt(&set()),
            "Could you tell me a little more about your legal issue? For example, is it about Family Law or Personal Injury?"
        );
    }

    #[test]
    fn join_or_handles_lists() {
        assert_eq!(join_or(&["A"]), "A");
        assert_eq!(join_or(&["A", "B", "C"]), "A, B or C");
    }
}
