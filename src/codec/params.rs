// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Parameter cleaning for the lite form.

use serde_json::Value;

/// Deserialized JSON values cannot alias, so a depth cap stands in for the
/// cycle guard a reference-graph walk would need.
const MAX_DEPTH: usize = 64;

/// Sentinel strings the editor writes for "not configured".
const SENTINELS: [&str; 2] = ["none", "off"];

/// Wrapper keys the editor always emits, even when empty.
const EMPTY_WRAPPERS: [&str; 2] = ["options", "additionalFields"];

/// Recursively removes configuration noise from a node's parameter tree.
///
/// Dropped: nulls, empty strings, empty arrays, empty objects, the sentinel
/// strings "none"/"off", and the conventional wrapper keys whose contents clean
/// down to nothing. Arrays are preserved as-is. Returns `None` when nothing
/// meaningful remains.
pub fn clean_parameters(parameters: &Value) -> Option<Value> {
    clean_value(parameters, 0)
}

fn clean_value(value: &Value, depth: usize) -> Option<Value> {
    if depth >= MAX_DEPTH {
        return Some(value.clone());
    }

    match value {
        Value::Null => None,
        Value::String(text) => {
            if text.is_empty() || SENTINELS.contains(&text.as_str()) {
                return None;
            }
            Some(value.clone())
        }
        Value::Array(items) => {
            if items.is_empty() {
                return None;
            }
            Some(value.clone())
        }
        Value::Object(fields) => {
            let mut cleaned = serde_json::Map::new();
            for (key, field) in fields {
                let Some(kept) = clean_value(field, depth + 1) else {
                    continue;
                };
                if EMPTY_WRAPPERS.contains(&key.as_str()) && is_empty_container(&kept) {
                    continue;
                }
                cleaned.insert(key.clone(), kept);
            }
            if cleaned.is_empty() {
                return None;
            }
            Some(Value::Object(cleaned))
        }
        _ => Some(value.clone()),
    }
}

fn is_empty_container(value: &Value) -> bool {
    match value {
        Value::Object(fields) => fields.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn drops_empty_and_sentinel_values() {
        let cleaned = clean_parameters(&json!({
            "url": "https://api.example.com",
            "method": "",
            "mode": "none",
            "proxy": "off",
            "headers": [],
            "options": {},
            "additionalFields": {"nested": {"inner": ""}},
            "note": null
        }))
        .expect("something remains");

        assert_eq!(cleaned, json!({"url": "https://api.example.com"}));
    }

    #[test]
    fn preserves_arrays_as_is() {
        let cleaned = clean_parameters(&json!({
            "rules": [{"value": ""}, {"value": "x"}]
        }))
        .expect("array kept");
        assert_eq!(cleaned, json!({"rules": [{"value": ""}, {"value": "x"}]}));
    }

    #[test]
    fn omits_objects_that_clean_to_nothing() {
        assert!(clean_parameters(&json!({"outer": {"inner": {"deep": null}}})).is_none());
    }

    #[test]
    fn keeps_false_and_zero() {
        let cleaned =
            clean_parameters(&json!({"enabled": false, "limit": 0})).expect("kept values");
        assert_eq!(cleaned, json!({"enabled": false, "limit": 0}));
    }

    #[test]
    fn deep_nesting_stops_at_cap() {
        let mut value = json!("leaf");
        for _ in 0..(MAX_DEPTH * 2) {
            value = json!({"wrap": value});
        }
        // Must terminate; content beyond the cap is passed through untouched.
        assert!(clean_parameters(&value).is_some());
    }
}
