//! Carrier error normalization
//!
//! Every carrier reports failures in its own shape: nested `error.moreInfo`
//! arrays, flat `validationErrors`, bare `errors` lists, assorted scalar
//! fields, or SOAP-ish `fault.faultstring` envelopes. The normalizer probes
//! an ordered list of small pure extractors and takes the first match, so a
//! new carrier shape is one more entry in the list. Malformed output
//! degrades to a generic message; this path never panics.

use serde_json::Value;

/// Upper bound on the normalized message length.
const MAX_MESSAGE_LEN: usize = 500;

type Extractor = fn(&Value) -> Option<String>;

/// Ordered by priority; first extractor returning a message wins.
const EXTRACTORS: &[Extractor] = &[
    extract_more_info,
    extract_validation_errors,
    extract_errors_array,
    extract_scalar_fields,
];

/// Produce a single human-readable message from a carrier error body.
///
/// `body` is the response text, read once; JSON parsing is best-effort and a
/// parse failure just means the raw text is used. Falls back to
/// `API error <status>` when nothing usable was found.
pub fn normalize_error_body(status: u16, body: &str) -> String {
    let message = match serde_json::from_str::<Value>(body) {
        Ok(json) => EXTRACTORS
            .iter()
            .find_map(|extract| extract(&json))
            .or_else(|| short_json_dump(&json)),
        Err(_) => {
            let raw = body.trim();
            (!raw.is_empty()).then(|| raw.to_string())
        }
    };

    match message {
        Some(m) if !m.trim().is_empty() => truncate(m),
        _ => format!("API error {status}"),
    }
}

fn truncate(mut message: String) -> String {
    if message.len() > MAX_MESSAGE_LEN {
        let mut cut = MAX_MESSAGE_LEN;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
    }
    message
}

/// Message-like content of one error-list element: a string, or the first of
/// several conventional message fields on an object.
fn element_message(element: &Value) -> Option<String> {
    if let Some(s) = element.as_str() {
        return Some(s.to_string());
    }
    for field in ["message", "msg", "description"] {
        if let Some(s) = element.get(field).and_then(Value::as_str) {
            let text = match element.get("field").and_then(Value::as_str) {
                Some(name) => format!("{name}: {s}"),
                None => s.to_string(),
            };
            return Some(text);
        }
    }
    None
}

fn join_elements(list: &Value) -> Option<String> {
    let items: Vec<String> = list.as_array()?.iter().filter_map(element_message).collect();
    (!items.is_empty()).then(|| items.join("; "))
}

fn extract_more_info(json: &Value) -> Option<String> {
    join_elements(json.get("error")?.get("moreInfo")?)
}

fn extract_validation_errors(json: &Value) -> Option<String> {
    join_elements(json.get("validationErrors")?)
}

fn extract_errors_array(json: &Value) -> Option<String> {
    join_elements(json.get("errors")?)
}

fn extract_scalar_fields(json: &Value) -> Option<String> {
    let probes = [
        json.get("message"),
        json.get("error").and_then(|e| e.get("message")),
        json.get("errorMessage"),
        json.get("detail"),
        json.get("fault").and_then(|f| f.get("faultstring")),
    ];
    probes
        .into_iter()
        .flatten()
        .find_map(Value::as_str)
        .map(str::to_string)
}

fn short_json_dump(json: &Value) -> Option<String> {
    let dump = json.to_string();
    (dump != "null" && dump != "{}" && dump != "[]").then_some(dump)
}
