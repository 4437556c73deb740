//! Correlation-key derivation for status polling
//!
//! To ask a carrier about a shipment we need at least one identifier the
//! carrier recognizes: PRO, BOL number, purchase order, pickup-request
//! number, and so on. Those identifiers are scattered across the four JSON
//! blobs stored on an order, so each poll cycle probes them in a fixed
//! priority order - structured BOL response, pickup response, rate-quote
//! response, then free-form metadata - and the first non-null value per key
//! wins. An empty result set means the order is skipped, not errored.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::types::ShipmentOrder;

/// Identifiers usable to query a carrier for shipment status. Derived per
/// order per poll cycle; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrelationKeys {
    pub pro: Option<String>,
    pub bol: Option<String>,
    pub po: Option<String>,
    pub pur: Option<String>,
    pub ldn: Option<String>,
    pub exl: Option<String>,
    pub interline_pro: Option<String>,
}

impl CorrelationKeys {
    pub fn is_empty(&self) -> bool {
        self.pro.is_none()
            && self.bol.is_none()
            && self.po.is_none()
            && self.pur.is_none()
            && self.ldn.is_none()
            && self.exl.is_none()
            && self.interline_pro.is_none()
    }

    /// Canonical parameter map for the shipment-history operation. The
    /// gateway filters this down to whatever the carrier's endpoint
    /// declares, so carrier-specific aliases are safe to include: XPO keys
    /// its tracking lookup on `referenceNumbers`, which we fill with the
    /// strongest identifier available.
    pub fn to_params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        let mut put = |key: &str, value: &Option<String>| {
            if let Some(v) = value {
                params.insert(key.to_string(), v.clone());
            }
        };
        put("pro", &self.pro);
        put("bol", &self.bol);
        put("po", &self.po);
        put("pur", &self.pur);
        put("ldn", &self.ldn);
        put("exl", &self.exl);
        put("interlinePro", &self.interline_pro);
        put(
            "referenceNumbers",
            &self.pro.clone().or_else(|| self.bol.clone()),
        );
        params
    }
}

/// Derive the correlation-key set for one order.
pub fn extract_correlation_keys(order: &ShipmentOrder) -> CorrelationKeys {
    let mut keys = CorrelationKeys::default();

    // 1. Structured BOL response: reference numbers, possibly wrapped in a
    // `data` envelope.
    if let Some(refs) = value_at(&order.bol_result, &["referenceNumbers"])
        .or_else(|| value_at(&order.bol_result, &["data", "referenceNumbers"]))
    {
        keys.pro = scalar(refs.get("pro"))
            .or_else(|| scalar(refs.get("shipmentConfirmationNumber")));
        keys.bol = scalar(refs.get("bol"));
    }

    // 2. Pickup response: the pickup-request number.
    keys.pur = scalar(order.pickup_result.get("pickupRequestId"))
        .or_else(|| scalar(value_at(&order.pickup_result, &["data", "pickupRequestId"])))
        .or_else(|| scalar(order.pickup_result.get("id")));

    // 3. Rate-quote response.
    // TODO: confirm with Estes that a rate-quote id is a valid load number;
    // the ldn slot is the only place the legacy data puts it.
    keys.ldn = scalar(order.rate_quote_result.get("quoteId"))
        .or_else(|| scalar(value_at(&order.rate_quote_result, &["data", "quoteId"])));

    // 4. Free-form order metadata.
    let meta = &order.orders_meta;
    keys.po = scalar(meta.get("po")).or_else(|| scalar(meta.get("purchaseOrder")));
    keys.exl = scalar(meta.get("exl"));
    keys.interline_pro = scalar(meta.get("interlinePro"));

    keys
}

fn value_at<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = root;
    for segment in path {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Stringify a scalar identifier; carriers send both strings and numbers.
fn scalar<'a>(value: impl Into<Option<&'a Value>>) -> Option<String> {
    match value.into()? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
