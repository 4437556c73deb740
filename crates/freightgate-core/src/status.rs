//! Canonical shipment status vocabulary and the carrier-response mapper
//!
//! Canonical progression: `pending -> picked_up -> in_transit -> delivered`,
//! with `delivered` terminal. The vocabulary is open: a carrier status the
//! mapper does not recognize passes through lower-cased so operators can see
//! it (e.g. `customs_hold`) instead of it being swallowed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ShipmentStatus {
    Pending,
    PickedUp,
    InTransit,
    Delivered,
    /// Unrecognized carrier status, carried lower-cased.
    Other(String),
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ShipmentStatus::Pending => "pending",
            ShipmentStatus::PickedUp => "picked_up",
            ShipmentStatus::InTransit => "in_transit",
            ShipmentStatus::Delivered => "delivered",
            ShipmentStatus::Other(s) => s,
        }
    }

    /// Delivered orders are never polled or reverted.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ShipmentStatus::Delivered)
    }
}

impl From<String> for ShipmentStatus {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "pending" => ShipmentStatus::Pending,
            "picked_up" => ShipmentStatus::PickedUp,
            "in_transit" => ShipmentStatus::InTransit,
            "delivered" => ShipmentStatus::Delivered,
            other => ShipmentStatus::Other(other.to_string()),
        }
    }
}

impl From<ShipmentStatus> for String {
    fn from(s: ShipmentStatus) -> Self {
        s.as_str().to_string()
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a carrier's shipment-history response onto the canonical vocabulary.
///
/// Carriers answer either with the payload at the root or wrapped in a
/// `data` envelope; both are accepted. Signals are probed strongest-first:
/// a delivery date (or explicit DELIVERED) wins over everything, then
/// in-transit, then pickup evidence. Anything else passes through.
pub fn map_history_response(response: &Value) -> ShipmentStatus {
    let body = response.get("data").unwrap_or(response);
    if !body.is_object() {
        return ShipmentStatus::Pending;
    }

    let status = body.get("status").and_then(Value::as_str);
    let has = |key: &str| body.get(key).map(|v| !v.is_null()).unwrap_or(false);

    if has("deliveryDate") || status == Some("DELIVERED") {
        return ShipmentStatus::Delivered;
    }
    if status == Some("IN_TRANSIT") {
        return ShipmentStatus::InTransit;
    }
    if status == Some("PICKED_UP") || has("pickupDate") {
        return ShipmentStatus::PickedUp;
    }

    match status {
        Some(s) => ShipmentStatus::from(s.to_string()),
        None => ShipmentStatus::Pending,
    }
}
