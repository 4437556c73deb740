//! Payload cleaning before transmission
//!
//! After the merge the request body is structurally complete but full of
//! untouched `null` placeholders. Carriers reject those, so the cleaner
//! prunes null leaves, empty objects, and empty arrays recursively, with a
//! small allow-list of exceptions the carriers' deserializers require:
//!
//! - emergency-contact scalar fields survive as an empty string
//! - `additionalService` survives as `[]` (the carrier expects an array of
//!   objects and rejects a string in its place)
//! - a phone sub-object whose `phoneNbr` is empty, invalid, or the literal
//!   `"+1"` placeholder is dropped whole; carriers reject malformed phone
//!   sub-objects outright, so pruning just the number is not enough

use serde_json::{Map, Value};

use crate::normalize::normalize_phone;

/// Scalar fields preserved as `""` when the merged value is still null.
const KEEP_AS_EMPTY_STRING: &[&str] = &["emergencyContactName"];

/// Array fields preserved when empty.
const KEEP_AS_EMPTY_ARRAY: &[&str] = &["additionalService"];

/// Object fields holding a `phoneNbr` leaf; dropped whole when the number
/// is unusable.
const PHONE_OBJECT_KEYS: &[&str] = &["phone", "emergencyContactPhone"];

/// Prune a merged request body. Always returns an object (possibly empty).
pub fn clean_payload(body: &Value) -> Value {
    match clean_value(body, None) {
        Some(v @ Value::Object(_)) => v,
        _ => Value::Object(Map::new()),
    }
}

fn clean_value(value: &Value, key: Option<&str>) -> Option<Value> {
    match value {
        Value::Null => {
            if key.is_some_and(|k| KEEP_AS_EMPTY_STRING.contains(&k)) {
                Some(Value::String(String::new()))
            } else {
                None
            }
        }
        Value::Object(fields) => {
            if key.is_some_and(|k| PHONE_OBJECT_KEYS.contains(&k)) && fields.contains_key("phoneNbr")
            {
                let number = fields.get("phoneNbr").and_then(Value::as_str).unwrap_or("");
                if phone_is_unusable(number) {
                    return None;
                }
            }
            let mut cleaned = Map::new();
            for (k, v) in fields {
                if let Some(kept) = clean_value(v, Some(k)) {
                    cleaned.insert(k.clone(), kept);
                }
            }
            if cleaned.is_empty() {
                None
            } else {
                Some(Value::Object(cleaned))
            }
        }
        Value::Array(items) => {
            let cleaned: Vec<Value> = items
                .iter()
                .filter_map(|item| clean_value(item, None))
                .collect();
            if cleaned.is_empty() && !key.is_some_and(|k| KEEP_AS_EMPTY_ARRAY.contains(&k)) {
                None
            } else {
                Some(Value::Array(cleaned))
            }
        }
        scalar => Some(scalar.clone()),
    }
}

fn phone_is_unusable(number: &str) -> bool {
    normalize_phone(number).is_empty()
}
