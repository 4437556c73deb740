//! Carrier-specific structural preconditions
//!
//! Checked against the merged request body before any network dispatch, so
//! obviously incomplete requests fail fast instead of burning a carrier
//! round-trip. Rules are keyed by (carrier, operation) exactly like the
//! registry, and they are NOT shared across carriers: Estes and XPO disagree
//! on the shape of the "same" logical operation (origin/destination vs
//! consignee/shipper), so each pair gets its own rule set. Unknown pairs
//! validate vacuously.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::normalize::normalize_phone;

/// Validate the merged body for `(carrier, operation)`.
pub fn validate_request(carrier: &str, operation: &str, body: &Value) -> Result<()> {
    match (carrier.to_ascii_lowercase().as_str(), operation) {
        ("xpo", "createBillOfLading") => xpo_bill_of_lading(body),
        ("xpo", "createRateQuote") => xpo_rate_quote(body),
        ("xpo", "createPickupRequest") => xpo_pickup_request(body),
        ("estes", "createBillOfLading") => estes_bill_of_lading(body),
        ("estes", "createRateQuote") => estes_rate_quote(body),
        ("estes", "createPickupRequest") => estes_pickup_request(body),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// XPO

fn xpo_bill_of_lading(body: &Value) -> Result<()> {
    require_str(body, "bol.requester.role")?;
    for party in ["consignee", "shipper", "billToCust"] {
        xpo_party_block(body, &format!("bol.{party}"))?;
    }

    let lines = require_array(body, "bol.commodityLine")?;
    for (i, line) in lines.iter().enumerate() {
        let at = |field: &str| format!("bol.commodityLine[{i}].{field}");
        require_positive(line, "pieceCnt", &at("pieceCnt"))?;
        require_positive(
            line.get("grossWeight").unwrap_or(&Value::Null),
            "weight",
            &at("grossWeight.weight"),
        )?;
        if line.get("desc").and_then(Value::as_str).unwrap_or("").trim().is_empty() {
            return Err(Error::validation(at("desc"), "commodity description is required"));
        }
    }
    Ok(())
}

/// Complete address + contact + valid-phone block for one XPO party.
fn xpo_party_block(body: &Value, prefix: &str) -> Result<()> {
    for field in ["address.addressLine1", "address.cityName", "address.postalCd"] {
        require_str(body, &format!("{prefix}.{field}"))?;
    }
    require_str(body, &format!("{prefix}.contactInfo.companyName"))?;
    let phone_path = format!("{prefix}.contactInfo.phone.phoneNbr");
    let number = str_at(body, &phone_path).unwrap_or("");
    if normalize_phone(number).is_empty() {
        return Err(Error::validation(phone_path, "a valid 10-digit phone number is required"));
    }
    Ok(())
}

fn xpo_rate_quote(body: &Value) -> Result<()> {
    require_str(body, "shipmentInfo.consignee.address.postalCd")?;
    require_str(body, "shipmentInfo.shipmentDate")?;
    let commodities = require_array(body, "shipmentInfo.commodity")?;
    for (i, item) in commodities.iter().enumerate() {
        require_positive(
            item.get("grossWeight").unwrap_or(&Value::Null),
            "weight",
            &format!("shipmentInfo.commodity[{i}].grossWeight.weight"),
        )?;
    }
    Ok(())
}

fn xpo_pickup_request(body: &Value) -> Result<()> {
    require_str(body, "pickupRqstInfo.pkupDate")?;
    require_str(body, "pickupRqstInfo.shipper.name")?;
    require_str(body, "pickupRqstInfo.shipper.postalCd")?;
    require_array(body, "pickupRqstInfo.pkupItem")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Estes

fn estes_bill_of_lading(body: &Value) -> Result<()> {
    require_str(body, "bol.requestedPickupDate")?;
    estes_party_block(body, "origin", true)?;
    estes_party_block(body, "destination", false)?;
    estes_party_block(body, "billTo", true)?;

    let units = require_array(body, "commodities.handlingUnits")?;
    for (i, unit) in units.iter().enumerate() {
        let at = |field: &str| format!("commodities.handlingUnits[{i}].{field}");
        require_positive(unit, "count", &at("count"))?;
        require_positive(unit, "weight", &at("weight"))?;
        let line_items = unit.get("lineItems").and_then(Value::as_array);
        let line_items = match line_items {
            Some(items) if !items.is_empty() => items,
            _ => return Err(Error::validation(at("lineItems"), "at least one line item is required")),
        };
        for (j, item) in line_items.iter().enumerate() {
            let line_at = |field: &str| at(&format!("lineItems[{j}].{field}"));
            require_positive(item, "pieces", &line_at("pieces"))?;
            require_positive(item, "weight", &line_at("weight"))?;
            if item.get("description").and_then(Value::as_str).unwrap_or("").trim().is_empty() {
                return Err(Error::validation(line_at("description"), "line item description is required"));
            }
        }
    }
    Ok(())
}

fn estes_party_block(body: &Value, prefix: &str, require_name: bool) -> Result<()> {
    if require_name {
        require_str(body, &format!("{prefix}.name"))?;
    }
    for field in ["address1", "city", "stateProvince", "postalCode"] {
        require_str(body, &format!("{prefix}.{field}"))?;
    }
    Ok(())
}

fn estes_rate_quote(body: &Value) -> Result<()> {
    require_str(body, "quoteRequest.shipDate")?;
    require_str(body, "quoteRequest.origin.address.postalCode")?;
    require_str(body, "quoteRequest.destination.address.postalCode")?;
    require_array(body, "commodity.handlingUnits")?;
    Ok(())
}

fn estes_pickup_request(body: &Value) -> Result<()> {
    require_str(body, "pickupDate")?;
    require_str(body, "shipper.shipperName")?;
    require_str(
        body,
        "shipper.shipperAddress.addressInfo.postalCode",
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Shared helpers

fn value_at<'a>(body: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = body;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

fn str_at<'a>(body: &'a Value, path: &str) -> Option<&'a str> {
    value_at(body, path).and_then(Value::as_str)
}

fn require_str(body: &Value, path: &str) -> Result<()> {
    match str_at(body, path) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(Error::validation(path, "field is required")),
    }
}

fn require_array<'a>(body: &'a Value, path: &str) -> Result<&'a Vec<Value>> {
    match value_at(body, path).and_then(Value::as_array) {
        Some(items) if !items.is_empty() => Ok(items),
        _ => Err(Error::validation(path, "at least one entry is required")),
    }
}

fn require_positive(parent: &Value, field: &str, path: &str) -> Result<()> {
    match parent.get(field).and_then(Value::as_f64) {
        Some(n) if n > 0.0 => Ok(()),
        _ => Err(Error::validation(path, "a positive number is required")),
    }
}
