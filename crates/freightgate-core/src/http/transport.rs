//! Carrier transport trait and the reqwest implementation
//!
//! The gateway and poller talk to carriers only through `CarrierTransport`,
//! injected as an explicit dependency. The real implementation carries a
//! per-request timeout so one unresponsive carrier cannot stall a poll cycle
//! indefinitely.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::encode::EncodedBody;
use crate::http::error::normalize_error_body;

/// A fully prepared outbound carrier request.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: String,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub query: Vec<(String, String)>,
    pub body: Option<EncodedBody>,
}

impl PreparedRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: HashMap::new(),
            query: Vec::new(),
            body: None,
        }
    }
}

/// Object-safe transport boundary.
#[async_trait]
pub trait CarrierTransport: Send + Sync {
    /// Execute the request and return the carrier's JSON response.
    ///
    /// Non-2xx responses come back as [`Error::Carrier`] with the normalized
    /// message and the carrier's status code.
    async fn execute(&self, request: PreparedRequest) -> Result<Value>;
}

/// reqwest-backed transport.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport with the given per-request timeout. A timeout is
    /// required, not optional.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(anyhow::anyhow!(e)),
            })?;
        Ok(Self { client })
    }

    fn parse_method(method: &str) -> Result<reqwest::Method> {
        method
            .to_ascii_uppercase()
            .parse()
            .map_err(|_| Error::Configuration {
                message: format!("unsupported HTTP method: {method}"),
                source: None,
            })
    }
}

#[async_trait]
impl CarrierTransport for HttpTransport {
    async fn execute(&self, request: PreparedRequest) -> Result<Value> {
        let method = Self::parse_method(&request.method)?;
        let mut builder = self.client.request(method, &request.url);

        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder
                .header("Content-Type", body.mime())
                .body(body.payload.clone());
        }

        tracing::debug!(url = %request.url, method = %request.method, "dispatching carrier request");

        let response = builder.send().await.map_err(|e| Error::Carrier {
            message: format!("carrier request failed: {e}"),
            status_code: None,
        })?;

        let status = response.status();
        // Read the body once as text; both paths need it.
        let body_text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let message = normalize_error_body(status.as_u16(), &body_text);
            tracing::warn!(status = status.as_u16(), %message, "carrier returned an error");
            return Err(Error::Carrier {
                message,
                status_code: Some(status.as_u16()),
            });
        }

        if body_text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body_text).map_err(|e| Error::Carrier {
            message: format!("carrier returned unparseable response: {e}"),
            status_code: Some(status.as_u16()),
        })
    }
}
