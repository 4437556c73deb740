//! Core data structures for the gateway
//!
//! These types mirror the external configuration and storage schemas: the
//! endpoint catalogue documents loaded by the registry, the shipment orders
//! held by the order store, and the per-carrier auth tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::status::ShipmentStatus;

/// Content type a carrier expects request bodies in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Json,
    FormUrlEncoded,
}

/// Request descriptor for one (carrier, operation) pair.
///
/// Immutable after catalogue load. `carrier` and `operation` are filled in by
/// the registry from the surrounding catalogue document; the remaining fields
/// deserialize straight from the endpoint descriptor JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointConfig {
    #[serde(default)]
    pub carrier: String,
    #[serde(default)]
    pub operation: String,
    pub url: String,
    pub method: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// JSON tree of typed-null leaves the caller payload is merged into.
    #[serde(default)]
    pub body_template: Option<Value>,
    /// Declared query-parameter names (values are null placeholders in the
    /// catalogue; only the names matter).
    #[serde(default)]
    pub query_parameters: Option<HashMap<String, Value>>,
}

impl EndpointConfig {
    /// Content type read from the configured headers. Defaults to JSON when
    /// the carrier does not declare one.
    pub fn content_type(&self) -> ContentType {
        let declared = self
            .headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| v.as_str())
            .unwrap_or("application/json");
        if declared
            .to_ascii_lowercase()
            .starts_with("application/x-www-form-urlencoded")
        {
            ContentType::FormUrlEncoded
        } else {
            ContentType::Json
        }
    }

    /// Names of the declared query parameters, if any.
    pub fn query_parameter_names(&self) -> Vec<&str> {
        self.query_parameters
            .as_ref()
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub(crate) fn require_url(&self) -> Result<&str> {
        if self.url.trim().is_empty() {
            return Err(Error::Configuration {
                message: format!(
                    "endpoint {}/{} has no URL configured",
                    self.carrier, self.operation
                ),
                source: None,
            });
        }
        Ok(&self.url)
    }
}

/// A shipment order as held by the order store.
///
/// Created on intake and mutated by every successful carrier call and by the
/// status poller. Never deleted automatically.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentOrder {
    pub id: i64,
    pub sku: String,
    /// Marketplace order reference (e.g. the Walmart order id).
    pub marketplace_ref: String,
    /// Free-form intake metadata.
    #[serde(default)]
    pub orders_meta: Value,
    /// Carrier response from rate-quote creation.
    #[serde(default)]
    pub rate_quote_result: Value,
    /// Carrier response from bill-of-lading creation.
    #[serde(default)]
    pub bol_result: Value,
    /// Carrier response from pickup-request creation.
    #[serde(default)]
    pub pickup_result: Value,
    pub status: ShipmentStatus,
    #[serde(default)]
    pub uploads: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShipmentOrder {
    /// Carrier this order ships with, read from intake metadata. Orders
    /// predating multi-carrier support carry no marker and default to Estes.
    pub fn carrier(&self) -> &str {
        self.orders_meta
            .get("carrier")
            .and_then(Value::as_str)
            .unwrap_or("estes")
    }
}

/// Bearer token stored per carrier. At most one row per carrier; the key is
/// the lower-cased carrier name and upserts are last-writer-wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarrierToken {
    pub carrier_name: String,
    pub token: String,
    pub updated_at: DateTime<Utc>,
}
