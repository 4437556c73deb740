//! Request body encoding
//!
//! The content type always comes from the endpoint configuration, never from
//! the call site. JSON carriers get the cleaned body serialized as-is;
//! form-encoded carriers (XPO auth) get the top-level pairs flattened, with
//! non-primitive values serialized to JSON strings before percent-encoding.

use serde_json::Value;
use url::form_urlencoded;

use crate::error::Result;
use crate::types::ContentType;

/// A wire-ready request body.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedBody {
    pub content_type: ContentType,
    pub payload: String,
}

impl EncodedBody {
    /// MIME string for the Content-Type header.
    pub fn mime(&self) -> &'static str {
        match self.content_type {
            ContentType::Json => "application/json",
            ContentType::FormUrlEncoded => "application/x-www-form-urlencoded",
        }
    }
}

/// Encode a cleaned body per the endpoint's declared content type.
pub fn encode_body(body: &Value, content_type: ContentType) -> Result<EncodedBody> {
    let payload = match content_type {
        ContentType::Json => serde_json::to_string(body)?,
        ContentType::FormUrlEncoded => encode_form(body)?,
    };
    Ok(EncodedBody {
        content_type,
        payload,
    })
}

fn encode_form(body: &Value) -> Result<String> {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    if let Value::Object(fields) = body {
        for (key, value) in fields {
            let encoded = match value {
                Value::Null => continue,
                Value::String(s) => s.clone(),
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                nested => serde_json::to_string(nested)?,
            };
            serializer.append_pair(key, &encoded);
        }
    }
    Ok(serializer.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_encoding() {
        let body = json!({"username": "ops", "password": "s3cret"});
        let encoded = encode_body(&body, ContentType::Json).unwrap();
        assert_eq!(encoded.mime(), "application/json");
        let round: Value = serde_json::from_str(&encoded.payload).unwrap();
        assert_eq!(round, body);
    }

    #[test]
    fn test_form_encoding_flattens_primitives() {
        let body = json!({"grant_type": "password", "username": "ops", "attempt": 2});
        let encoded = encode_body(&body, ContentType::FormUrlEncoded).unwrap();
        assert_eq!(encoded.mime(), "application/x-www-form-urlencoded");
        assert!(encoded.payload.contains("grant_type=password"));
        assert!(encoded.payload.contains("username=ops"));
        assert!(encoded.payload.contains("attempt=2"));
    }

    #[test]
    fn test_form_encoding_serializes_nested_values_as_json() {
        let body = json!({"meta": {"a": 1}, "tags": ["x", "y"]});
        let encoded = encode_body(&body, ContentType::FormUrlEncoded).unwrap();
        // Percent-encoded JSON strings
        assert!(encoded.payload.contains("meta=%7B%22a%22%3A1%7D"));
        assert!(encoded.payload.contains("tags=%5B%22x%22%2C%22y%22%5D"));
    }

    #[test]
    fn test_form_encoding_skips_null_and_escapes() {
        let body = json!({"a": null, "q": "a b&c"});
        let encoded = encode_body(&body, ContentType::FormUrlEncoded).unwrap();
        assert_eq!(encoded.payload, "q=a+b%26c");
    }
}
