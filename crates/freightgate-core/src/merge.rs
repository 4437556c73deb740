//! Template merge engine
//!
//! Deep-merges a caller's partial payload into a carrier body template. The
//! shared template is never mutated; the merge works on a clone. Rules:
//!
//! - a user value of `null` leaves the template placeholder untouched
//! - object-into-object recurses
//! - anything else (primitive, array, or type mismatch) replaces the
//!   template value wholesale; arrays are never merged element-wise
//! - keys absent from the template are written through at the current level
//!
//! Merging an empty payload therefore returns a structure deep-equal to the
//! template, and the merge is idempotent for a fixed payload.

use serde_json::Value;

/// Merge `payload` into a clone of `template`.
pub fn merge_template(template: &Value, payload: &Value) -> Value {
    let mut merged = template.clone();
    merge_into(&mut merged, payload);
    merged
}

fn merge_into(target: &mut Value, payload: &Value) {
    let Value::Object(user_fields) = payload else {
        return;
    };
    let Value::Object(target_fields) = target else {
        return;
    };

    for (key, user_value) in user_fields {
        if user_value.is_null() {
            continue;
        }
        match (target_fields.get_mut(key), user_value) {
            (Some(existing @ Value::Object(_)), Value::Object(_)) => {
                merge_into(existing, user_value);
            }
            (Some(existing), _) => {
                *existing = user_value.clone();
            }
            (None, _) => {
                target_fields.insert(key.clone(), user_value.clone());
            }
        }
    }
}
