//! JSON utilities: path flattening and RFC 7396 merge-patch.

use serde_json::{Map, Value};

/// Flattens a JSON object so nested object keys are joined with `.`.
///
/// `{"a":{"b":1}}` becomes `{"a.b":1}`. Arrays and scalars are leaves and
/// are not descended into. Order of the resulting map is not significant.
#[must_use]
pub fn flatten(obj: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    flatten_into(obj, String::new(), &mut out);
    out
}

fn flatten_into(obj: &Map<String, Value>, prefix: String, out: &mut Map<String, Value>) {
    for (k, v) in obj {
        let path = if prefix.is_empty() {
            k.clone()
        } else {
            format!("{prefix}.{k}")
        };
        match v {
            Value::Object(nested) => flatten_into(nested, path, out),
            other => {
                out.insert(path, other.clone());
            }
        }
    }
}

/// Merges `patch` into `target` per RFC 7396 (JSON Merge Patch).
///
/// For every key in `patch`: if the value is `null`, the key is removed
/// from `target`; if both sides are objects, the merge recurses; otherwise
/// the patch value replaces the target value outright. Arrays are replaced
/// wholesale, never merged element-wise.
#[must_use]
pub fn merge_patch(target: &Value, patch: &Value) -> Value {
    let Value::Object(patch_obj) = patch else {
        // A non-object patch replaces the target entirely (RFC 7396 §2).
        return patch.clone();
    };

    let mut result = match target {
        Value::Object(obj) => obj.clone(),
        _ => Map::new(),
    };

    for (key, patch_value) in patch_obj {
        if patch_value.is_null() {
            result.remove(key);
            continue;
        }
        let existing = result.get(key).cloned().unwrap_or(Value::Null);
        let merged = if existing.is_object() && patch_value.is_object() {
            merge_patch(&existing, patch_value)
        } else {
            patch_value.clone()
        };
        result.insert(key.clone(), merged);
    }

    Value::Object(result)
}


#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::{json, Map, Number, Value};

    // Excludes `Value::Null`: a `null` leaf fed back into `merge_patch` as
    // its own patch would delete itself (RFC 7396), breaking the
    // self-merge-is-identity property below. `flatten` has no such
    // restriction, but one generator for both keeps this module simple.
    fn scalar_strategy() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(|n| Value::Number(Number::from(n))),
            "[a-z]{0,8}".prop_map(Value::String),
        ]
    }

    fn flat_object_strategy() -> impl Strategy<Value = Map<String, Value>> {
        proptest::collection::btree_map("[a-z]{1,6}", scalar_strategy(), 0..6)
            .prop_map(|m| m.into_iter().collect())
    }

    proptest! {
        /// Property: flattening an already-flat object is the identity, since
        /// there are no nested objects left to descend into.
        #[test]
        fn prop_flatten_is_identity_on_flat_objects(obj in flat_object_strategy()) {
            let flattened = flatten(&obj);
            prop_assert_eq!(flattened, obj);
        }

        /// Property: merging an object with itself as its own patch is the
        /// identity (every key replaces itself with an identical value).
        #[test]
        fn prop_merge_patch_self_is_identity(obj in flat_object_strategy()) {
            let target = Value::Object(obj.clone());
            let merged = merge_patch(&target, &target);
            prop_assert_eq!(merged, target);
        }

        /// Property: an empty patch never changes the target (spec §8,
        /// "update idempotence under empty patch").
        #[test]
        fn prop_empty_patch_is_identity(obj in flat_object_strategy()) {
            let target = Value::Object(obj);
            let merged = merge_patch(&target, &json!({}));
            prop_assert_eq!(merged, target);
        }
    }
}
