//! Decoder for SvelteKit's `devalue` wire format: a flat JSON array where
//! non-negative integers (outside booleans) are indices back into the same
//! array rather than literal numbers. A handful of `__data.json` endpoints
//! ship their payload this way to dedupe repeated substructures.

use serde_json::Value;

/// Recursively resolves `data[0]` against the flat `data` array, replacing
/// every non-negative integer found in a list or object with the value it
/// indexes.
pub fn decode(data: &[Value]) -> Value {
    if data.is_empty() {
        return Value::Null;
    }
    resolve_value(data, &data[0])
}

fn resolve_value(data: &[Value], value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| resolve_maybe_ref(data, item))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), resolve_maybe_ref(data, v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn resolve_maybe_ref(data: &[Value], value: &Value) -> Value {
    // JSON keeps numbers and booleans as distinct types, unlike Python where
    // `bool` is an `int` subclass — no extra bool-exclusion check needed here.
    if let Value::Number(n) = value {
        if let Some(idx) = n.as_u64() {
            if let Some(target) = data.get(idx as usize) {
                return resolve_value(data, target);
            }
        }
    }
    resolve_value(data, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_simple_reference_chain() {
        // data[0] = {"name": 1}, data[1] = "hello"
        let data = vec![json!({"name": 1}), json!("hello")];
        let decoded = decode(&data);
        assert_eq!(decoded, json!({"name": "hello"}));
    }

    #[test]
    fn resolves_nested_array_references() {
        // data[0] = [1, 2], data[1] = "a", data[2] = "b"
        let data = vec![json!([1, 2]), json!("a"), json!("b")];
        let decoded = decode(&data);
        assert_eq!(decoded, json!(["a", "b"]));
    }

    #[test]
    fn leaves_literal_strings_and_negative_like_values_alone() {
        let data = vec![json!({"label": "already a string", "count": -1})];
        let decoded = decode(&data);
        assert_eq!(decoded["label"], json!("already a string"));
    }

    #[test]
    fn empty_data_yields_null() {
        assert_eq!(decode(&[]), Value::Null);
    }
}
