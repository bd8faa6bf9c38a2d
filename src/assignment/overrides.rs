//! Variant override merge policy.
//!
//! Consumers apply a variant's configuration payload onto their own
//! baseline. The policy is one level of recursive merge: top-level keys
//! overwrite, except when both sides hold JSON objects, which merge
//! key-by-key; anything nested deeper is replaced wholesale.

use serde_json::Value;

/// Merge a variant's `overrides` onto a `base` configuration.
///
/// - `Null` overrides (a variant with no payload): the base is unchanged.
/// - Non-object on either side: the override value wins wholesale.
/// - Top-level key present only in one side: kept as-is.
/// - Top-level key holding objects on both sides: merged key-by-key, with
///   the override's entries replacing the base's. The merge does not
///   recurse further; a second-level object from the override replaces the
///   base's second-level object entirely.
///
/// # Example
///
/// ```rust
/// use cohort::assignment::merge_overrides;
/// use serde_json::json;
///
/// let base = json!({"theme": {"color": "grey", "font": "sans"}, "steps": 5});
/// let overrides = json!({"theme": {"color": "blue"}});
///
/// let merged = merge_overrides(&base, &overrides);
/// assert_eq!(merged, json!({"theme": {"color": "blue", "font": "sans"}, "steps": 5}));
/// ```
#[must_use]
pub fn merge_overrides(base: &Value, overrides: &Value) -> Value {
    if overrides.is_null() {
        return base.clone();
    }
    let (Value::Object(base_map), Value::Object(override_map)) = (base, overrides) else {
        return overrides.clone();
    };

    let mut merged = base_map.clone();
    for (key, value) in override_map {
        match (merged.get(key), value) {
            (Some(Value::Object(base_nested)), Value::Object(override_nested)) => {
                let mut nested = base_nested.clone();
                for (nested_key, nested_value) in override_nested {
                    nested.insert(nested_key.clone(), nested_value.clone());
                }
                merged.insert(key.clone(), Value::Object(nested));
            }
            _ => {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    Value::Object(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shallow_keys_overwrite() {
        let base = json!({"steps": 5, "skip_intro": false});
        let overrides = json!({"skip_intro": true});
        let merged = merge_overrides(&base, &overrides);
        assert_eq!(merged, json!({"steps": 5, "skip_intro": true}));
    }

    #[test]
    fn test_nested_objects_merge_one_level() {
        let base = json!({"theme": {"color": "grey", "font": "sans"}});
        let overrides = json!({"theme": {"color": "blue"}});
        let merged = merge_overrides(&base, &overrides);
        assert_eq!(merged, json!({"theme": {"color": "blue", "font": "sans"}}));
    }

    #[test]
    fn test_deeper_structures_replaced_wholesale() {
        let base = json!({"layout": {"header": {"logo": "big", "menu": "left"}}});
        let overrides = json!({"layout": {"header": {"logo": "small"}}});
        let merged = merge_overrides(&base, &overrides);
        // The second-level "header" object is replaced, not merged.
        assert_eq!(merged, json!({"layout": {"header": {"logo": "small"}}}));
    }

    #[test]
    fn test_type_mismatch_takes_override() {
        let base = json!({"theme": {"color": "grey"}});
        let overrides = json!({"theme": "dark"});
        let merged = merge_overrides(&base, &overrides);
        assert_eq!(merged, json!({"theme": "dark"}));
    }

    #[test]
    fn test_null_override_leaves_base_unchanged() {
        let base = json!({"steps": 5});
        let merged = merge_overrides(&base, &Value::Null);
        assert_eq!(merged, base);
    }

    #[test]
    fn test_non_object_base_takes_override() {
        let merged = merge_overrides(&json!(42), &json!({"steps": 5}));
        assert_eq!(merged, json!({"steps": 5}));
    }
}
