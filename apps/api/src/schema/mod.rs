//! Field schema types and the validator that turns raw LLM output into them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One fillable document field.
///
/// `id` is always lowercase `[a-z0-9_]+`; it is derived deterministically
/// from whatever the model emitted. Duplicate ids across a schema are
/// permitted — no dedup is enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub default: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

/// Ordered collection of fields, in the order the upstream extraction
/// emitted them.
pub type Schema = Vec<FieldSpec>;

/// Lowercases and strips every character outside `[a-z0-9_]`.
pub fn normalize_id(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .collect()
}

/// Filters and normalizes an arbitrary JSON array into a well-formed schema.
///
/// Never errors: malformed items are silently dropped and only counted.
/// An item survives when it is an object with non-empty string `id` and
/// `label`, and its id is still non-empty after normalization. Dropping
/// ids that normalize to empty is deliberate; keeping them would produce
/// fields no placeholder syntax can ever reference.
pub fn validate_fields(raw_items: &[Value]) -> (Schema, usize) {
    let mut schema = Vec::new();
    let mut dropped = 0usize;

    for item in raw_items {
        match validate_item(item) {
            Some(field) => schema.push(field),
            None => dropped += 1,
        }
    }

    (schema, dropped)
}

fn validate_item(item: &Value) -> Option<FieldSpec> {
    let obj = item.as_object()?;

    let raw_id = obj.get("id")?.as_str()?;
    let label = obj.get("label")?.as_str()?.trim();
    if raw_id.trim().is_empty() || label.is_empty() {
        return None;
    }

    let id = normalize_id(raw_id);
    if id.is_empty() {
        return None;
    }

    let default = match obj.get("default") {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Null) | None => String::new(),
        // Numbers and booleans are usable defaults; coerce to text.
        Some(other) => other.to_string(),
    };

    let section = obj
        .get("section")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

    Some(FieldSpec {
        id,
        label: label.to_string(),
        default,
        section,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_id_strips_spaces_not_underscores() {
        assert_eq!(normalize_id("My Name"), "myname");
        assert_eq!(normalize_id("first_name"), "first_name");
    }

    #[test]
    fn test_normalize_id_lowercases_and_strips_punctuation() {
        assert_eq!(normalize_id("John-Doe!!"), "johndoe");
        assert_eq!(normalize_id("Email_2"), "email_2");
    }

    #[test]
    fn test_valid_item_passes_with_label_trimmed() {
        let raw = vec![json!({"id": "My Name", "label": "  John Doe!!  ", "default": " Jane "})];
        let (schema, dropped) = validate_fields(&raw);
        assert_eq!(dropped, 0);
        assert_eq!(schema.len(), 1);
        assert_eq!(schema[0].id, "myname");
        assert_eq!(schema[0].label, "John Doe!!");
        assert_eq!(schema[0].default, "Jane");
    }

    #[test]
    fn test_drops_item_missing_id() {
        let raw = vec![json!({"label": "Full Name"})];
        let (schema, dropped) = validate_fields(&raw);
        assert!(schema.is_empty());
        assert_eq!(dropped, 1);
    }

    #[test]
    fn test_drops_item_missing_label() {
        let raw = vec![json!({"id": "name"})];
        let (schema, dropped) = validate_fields(&raw);
        assert!(schema.is_empty());
        assert_eq!(dropped, 1);
    }

    #[test]
    fn test_drops_non_object_items() {
        let raw = vec![json!("name"), json!(42), json!(null), json!(["nested"])];
        let (schema, dropped) = validate_fields(&raw);
        assert!(schema.is_empty());
        assert_eq!(dropped, 4);
    }

    #[test]
    fn test_drops_id_that_normalizes_to_empty() {
        // "!!!" passes the string-type check but has no usable characters left.
        let raw = vec![json!({"id": "!!!", "label": "Broken"})];
        let (schema, dropped) = validate_fields(&raw);
        assert!(schema.is_empty());
        assert_eq!(dropped, 1);
    }

    #[test]
    fn test_absent_default_becomes_empty_string() {
        let raw = vec![json!({"id": "city", "label": "City"})];
        let (schema, _) = validate_fields(&raw);
        assert_eq!(schema[0].default, "");
    }

    #[test]
    fn test_numeric_default_coerced_to_string() {
        let raw = vec![json!({"id": "years", "label": "Years", "default": 5})];
        let (schema, _) = validate_fields(&raw);
        assert_eq!(schema[0].default, "5");
    }

    #[test]
    fn test_section_kept_when_present() {
        let raw = vec![json!({"id": "role", "label": "Role", "section": "Experience"})];
        let (schema, _) = validate_fields(&raw);
        assert_eq!(schema[0].section.as_deref(), Some("Experience"));
    }

    #[test]
    fn test_duplicate_ids_are_not_deduped() {
        let raw = vec![
            json!({"id": "name", "label": "Name"}),
            json!({"id": "name", "label": "Name Again"}),
        ];
        let (schema, dropped) = validate_fields(&raw);
        assert_eq!(schema.len(), 2);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn test_order_preserved() {
        let raw = vec![
            json!({"id": "b", "label": "B"}),
            json!({"id": "a", "label": "A"}),
        ];
        let (schema, _) = validate_fields(&raw);
        assert_eq!(schema[0].id, "b");
        assert_eq!(schema[1].id, "a");
    }
}
