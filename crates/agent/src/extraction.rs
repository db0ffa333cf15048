//! Defensive parsing of structured replies from the inference service.
//!
//! Models wrap JSON in prose or code fences and drift on types, so everything
//! here is tolerant: a reply either yields a usable object or `None`, never an error.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Parses the outermost JSON object embedded in `raw`.
pub fn parse_json_reply<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&raw[start..=end]).ok()
}

/// Whether an indicator field carries information: not null, false, blank or empty.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(_) => true,
        Value::String(text) => {
            let text = text.trim();
            !text.is_empty() && !matches!(text.to_ascii_lowercase().as_str(), "none" | "null" | "n/a")
        }
        Value::Array(items) => items.iter().any(is_present),
        Value::Object(fields) => fields.values().any(is_present),
    }
}

pub fn as_text(value: &Value) -> Option<&str> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim()),
        _ => None,
    }
}

/// Free-text items from either a single string or an array of strings.
pub fn text_items(value: &Value) -> Vec<String> {
    match value {
        Value::String(_) => as_text(value).map(|text| vec![text.to_string()]).unwrap_or_default(),
        Value::Array(items) => {
            items.iter().filter_map(as_text).map(str::to_string).collect()
        }
        _ => Vec::new(),
    }
}

/// A numeric score given either as a JSON number or a numeric string.
pub fn as_score(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::{as_score, is_present, parse_json_reply, text_items};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        value: u32,
    }

    #[test]
    fn parses_plain_and_fenced_objects() {
        assert_eq!(parse_json_reply::<Sample>(r#"{"value": 3}"#), Some(Sample { value: 3 }));
        assert_eq!(
            parse_json_reply::<Sample>("Here you go:\n```json\n{\"value\": 7}\n```\nThanks"),
            Some(Sample { value: 7 })
        );
    }

    #[test]
    fn rejects_prose_and_broken_json() {
        assert_eq!(parse_json_reply::<Sample>("I could not determine that."), None);
        assert_eq!(parse_json_reply::<Sample>("{\"value\": }"), None);
        assert_eq!(parse_json_reply::<Sample>("} backwards {"), None);
    }

    #[test]
    fn presence_rules_ignore_empty_indicators() {
        assert!(!is_present(&json!(null)));
        assert!(!is_present(&json!(false)));
        assert!(!is_present(&json!("  ")));
        assert!(!is_present(&json!("None")));
        assert!(!is_present(&json!([])));
        assert!(!is_present(&json!({"amount": null})));
        assert!(is_present(&json!("about $50k")));
        assert!(is_present(&json!(true)));
        assert!(is_present(&json!(["reporting"])));
    }

    #[test]
    fn text_items_accepts_string_or_list() {
        assert_eq!(text_items(&json!("slow onboarding")), vec!["slow onboarding".to_string()]);
        assert_eq!(
            text_items(&json!(["a", "", 3, "b"])),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(text_items(&json!(null)).is_empty());
    }

    #[test]
    fn scores_accept_numbers_and_numeric_strings() {
        assert_eq!(as_score(&json!(72)), Some(72.0));
        assert_eq!(as_score(&json!("85%")), Some(85.0));
        assert_eq!(as_score(&json!("high")), None);
    }
}
