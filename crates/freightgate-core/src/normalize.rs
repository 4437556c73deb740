//! Field normalization applied to caller payloads before merging
//!
//! Carriers are strict about leaf formats while callers are not: phone
//! numbers arrive with any mix of punctuation and country codes, and string
//! fields arrive with stray whitespace. Normalization happens once, up
//! front, so the merge and cleaner operate on canonical values.

use serde_json::Value;

/// Canonicalize a US-style phone number to `NNN-NNNNNNN`.
///
/// A leading country code is stripped only when unambiguous: an explicit
/// `+1` prefix, or a bare leading `1` that makes the total exactly 11
/// digits. After stripping punctuation the number must have exactly 10
/// significant digits; anything else yields an empty string, the signal for
/// "no usable phone".
pub fn normalize_phone(input: &str) -> String {
    let trimmed = input.trim();
    let rest = trimmed.strip_prefix("+1").unwrap_or(trimmed);

    let mut digits: Vec<u8> = rest.bytes().filter(u8::is_ascii_digit).collect();
    if digits.len() == 11 && digits[0] == b'1' {
        digits.remove(0);
    }
    if digits.len() != 10 {
        return String::new();
    }

    let s = String::from_utf8(digits).expect("ascii digits");
    format!("{}-{}", &s[..3], &s[3..])
}

/// Walk a caller payload, trimming every string leaf and canonicalizing
/// phone-bearing leaves (`phone`, `phoneNbr`, `emergencyContactPhone`)
/// through [`normalize_phone`].
pub fn normalize_payload(payload: &Value) -> Value {
    normalize_value(payload, None)
}

fn normalize_value(value: &Value, key: Option<&str>) -> Value {
    match value {
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), normalize_value(v, Some(k))))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| normalize_value(item, None))
                .collect(),
        ),
        Value::String(s) => {
            if matches!(
                key,
                Some("phone") | Some("phoneNbr") | Some("emergencyContactPhone")
            ) {
                Value::String(normalize_phone(s))
            } else {
                Value::String(s.trim().to_string())
            }
        }
        other => other.clone(),
    }
}
