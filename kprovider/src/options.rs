//! Declarative model-option entries and the left-to-right merge that turns
//! them into flat request options.
//!
//! ```rust
//! use kprovider::{ModelOptionEntry, resolve_model_options};
//! use serde_json::json;
//!
//! let entries = vec![
//!     ModelOptionEntry::new("temperature", json!(0.5)),
//!     ModelOptionEntry::new("\"temperature\"", json!(0.9)),
//! ];
//!
//! let options = resolve_model_options(&entries);
//! assert_eq!(options.get("temperature"), Some(&json!(0.9)));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of a model's configuration table. Entries are ordered; later
/// entries for the same field override earlier ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOptionEntry {
    pub field: String,
    pub value: Value,
    pub enabled: bool,
}

impl ModelOptionEntry {
    pub fn new(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            value,
            enabled: true,
        }
    }

    pub fn disabled(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            value,
            enabled: false,
        }
    }
}

/// Merges option entries into a flat map, last write wins.
///
/// Entry processing, in order: disabled or empty-field entries are dropped;
/// one pair of wrapping double quotes is stripped from the field name; null
/// values are dropped; string values that look like JSON objects or arrays
/// are parsed, keeping the original string when parsing fails. This never
/// errors — an empty input yields an empty map.
pub fn resolve_model_options(entries: &[ModelOptionEntry]) -> Map<String, Value> {
    let mut options = Map::new();

    for entry in entries {
        if !entry.enabled || entry.field.is_empty() {
            continue;
        }

        let field = strip_wrapping_quotes(&entry.field);

        if entry.value.is_null() {
            continue;
        }

        let value = match &entry.value {
            Value::String(raw) if raw.starts_with('{') || raw.starts_with('[') => {
                serde_json::from_str::<Value>(raw).unwrap_or_else(|_| entry.value.clone())
            }
            other => other.clone(),
        };

        options.insert(field.to_string(), value);
    }

    options
}

fn strip_wrapping_quotes(field: &str) -> &str {
    if field.len() >= 2 && field.starts_with('"') && field.ends_with('"') {
        &field[1..field.len() - 1]
    } else {
        field
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn later_entries_override_earlier_ones() {
        let entries = vec![
            ModelOptionEntry::new("t", json!(0.5)),
            ModelOptionEntry::new("\"t\"", json!(0.9)),
        ];

        let options = resolve_model_options(&entries);
        assert_eq!(options.len(), 1);
        assert_eq!(options.get("t"), Some(&json!(0.9)));
    }

    #[test]
    fn disabled_and_unnamed_entries_are_dropped() {
        let entries = vec![
            ModelOptionEntry::disabled("temperature", json!(0.7)),
            ModelOptionEntry::new("", json!(1)),
            ModelOptionEntry::new("max_tokens", json!(256)),
        ];

        let options = resolve_model_options(&entries);
        assert_eq!(options.len(), 1);
        assert_eq!(options.get("max_tokens"), Some(&json!(256)));
    }

    #[test]
    fn null_values_are_dropped() {
        let entries = vec![ModelOptionEntry::new("stop", Value::Null)];
        assert!(resolve_model_options(&entries).is_empty());
    }

    #[test]
    fn json_looking_strings_are_parsed() {
        let entries = vec![
            ModelOptionEntry::new("response_format", json!("{\"type\":\"json_object\"}")),
            ModelOptionEntry::new("stop", json!("[\"\\n\"]")),
        ];

        let options = resolve_model_options(&entries);
        assert_eq!(
            options.get("response_format"),
            Some(&json!({"type": "json_object"}))
        );
        assert_eq!(options.get("stop"), Some(&json!(["\n"])));
    }

    #[test]
    fn unparseable_json_strings_stay_verbatim() {
        let entries = vec![ModelOptionEntry::new("broken", json!("{not json"))];

        let options = resolve_model_options(&entries);
        assert_eq!(options.get("broken"), Some(&json!("{not json")));
    }

    #[test]
    fn plain_string_values_are_untouched() {
        let entries = vec![ModelOptionEntry::new("user", json!("tenant-42"))];

        let options = resolve_model_options(&entries);
        assert_eq!(options.get("user"), Some(&json!("tenant-42")));
    }

    #[test]
    fn no_entries_yield_an_empty_map() {
        assert!(resolve_model_options(&[]).is_empty());
    }
}
