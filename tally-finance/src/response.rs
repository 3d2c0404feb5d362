//! Pull a categorization out of free-form model text.
//!
//! Models wrap their JSON in prose or code fences, and explanations can
//! contain braces, so the object is located with a balanced-brace scan that
//! respects JSON strings rather than a greedy pattern.

use serde_json::{Map, Value};
use tally_core::{CategorizationResult, ResultSource, clamp_confidence, find_category};

use crate::llm::ClassifyError;

pub const DEFAULT_CONFIDENCE: f64 = 0.5;
pub const DEFAULT_EXPLANATION: &str = "Categorized by AI model";

/// First balanced `{...}` span in `text` that parses as a JSON object.
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    text.char_indices()
        .filter(|&(_, c)| c == '{')
        .find_map(|(start, _)| {
            let end = balanced_end(text, start)?;
            match serde_json::from_str::<Value>(&text[start..=end]) {
                Ok(Value::Object(map)) => Some(map),
                _ => None,
            }
        })
}

/// Byte index of the `}` closing the `{` at `start`.
fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(start + i);
                }
            }
            _ => {}
        }
    }
    None
}

fn read_confidence(value: Option<&Value>) -> f64 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    raw.filter(|v| v.is_finite())
        .map(clamp_confidence)
        .unwrap_or(DEFAULT_CONFIDENCE)
}

/// Interpret a model reply. The category must name a taxonomy entry;
/// subcategories outside that entry are dropped.
pub fn parse_classification(text: &str) -> Result<CategorizationResult, ClassifyError> {
    let obj = extract_json_object(text)
        .ok_or_else(|| ClassifyError::BadResponse("no JSON object in reply".to_string()))?;

    let raw_category = obj
        .get("category")
        .and_then(Value::as_str)
        .ok_or_else(|| ClassifyError::BadResponse("missing category".to_string()))?;
    let category = find_category(raw_category)
        .ok_or_else(|| ClassifyError::BadResponse(format!("unknown category '{raw_category}'")))?;

    let subcategory = obj
        .get("subcategory")
        .and_then(Value::as_str)
        .and_then(|s| category.subcategory(s));

    let explanation = obj
        .get("explanation")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .unwrap_or(DEFAULT_EXPLANATION);

    Ok(CategorizationResult::new(
        category.name,
        subcategory,
        read_confidence(obj.get("confidence")),
        explanation,
        ResultSource::Remote,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_from_code_fence_and_prose() {
        let text = "Sure! Here you go:\n```json\n{\"category\": \"Dining\", \"confidence\": 0.8}\n```\nHope that helps {really}.";
        let obj = extract_json_object(text).unwrap();
        assert_eq!(obj["category"], "Dining");
    }

    #[test]
    fn test_braces_inside_strings_do_not_end_object() {
        let text = r#"{"category": "Shopping", "explanation": "matched {electronics} } rule"} trailing"#;
        let obj = extract_json_object(text).unwrap();
        assert_eq!(obj["explanation"], "matched {electronics} } rule");
    }

    #[test]
    fn test_skips_non_json_brace_spans() {
        let text = "Thinking {not json} then {\"category\": \"Travel\"}";
        let obj = extract_json_object(text).unwrap();
        assert_eq!(obj["category"], "Travel");
        assert!(extract_json_object("no object here").is_none());
        assert!(extract_json_object("{\"unterminated\": 1").is_none());
    }

    #[test]
    fn test_confidence_is_clamped_or_defaulted() {
        let r = parse_classification(r#"{"category":"Groceries","confidence":1.5,"explanation":"x"}"#).unwrap();
        assert_eq!(r.confidence, 1.0);
        let r = parse_classification(r#"{"category":"Groceries","confidence":-3}"#).unwrap();
        assert_eq!(r.confidence, 0.0);
        let r = parse_classification(r#"{"category":"Groceries"}"#).unwrap();
        assert_eq!(r.confidence, DEFAULT_CONFIDENCE);
        let r = parse_classification(r#"{"category":"Groceries","confidence":"high"}"#).unwrap();
        assert_eq!(r.confidence, DEFAULT_CONFIDENCE);
        let r = parse_classification(r#"{"category":"Groceries","confidence":"0.7"}"#).unwrap();
        assert_eq!(r.confidence, 0.7);
    }

    #[test]
    fn test_category_normalized_and_defaults_applied() {
        let r = parse_classification(r#"{"category":"dining","subcategory":"coffee shops","confidence":0.9}"#).unwrap();
        assert_eq!(r.category, "Dining");
        assert_eq!(r.subcategory.as_deref(), Some("Coffee Shops"));
        assert_eq!(r.explanation, DEFAULT_EXPLANATION);
        assert_eq!(r.source, ResultSource::Remote);

        let r = parse_classification(r#"{"category":"Dining","subcategory":null}"#).unwrap();
        assert_eq!(r.subcategory, None);
        let r = parse_classification(r#"{"category":"Dining","subcategory":"Fuel"}"#).unwrap();
        assert_eq!(r.subcategory, None);
    }

    #[test]
    fn test_rejects_unknown_or_missing_category() {
        assert!(parse_classification(r#"{"category":"Pets"}"#).is_err());
        assert!(parse_classification(r#"{"confidence":0.9}"#).is_err());
        assert!(parse_classification("I could not decide").is_err());
    }
}
