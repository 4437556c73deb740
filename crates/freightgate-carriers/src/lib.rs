//! Built-in carrier endpoint catalogues for the freightgate gateway.
//!
//! Each catalogue document describes one carrier: its base URL and the
//! request descriptor for every supported operation (auth, rate quote, bill
//! of lading, pickup request, shipment history). URLs and API keys are kept
//! as `${ENV:VAR}` placeholders and expanded by the registry at load time.
//!
//! Deployments that integrate additional carriers can load their own
//! catalogue documents from disk; these built-ins are just data.

use serde_json::Value;

/// Estes Express Lines catalogue document (JSON source).
pub const ESTES: &str = include_str!("carriers/estes.json");

/// XPO Logistics catalogue document (JSON source).
pub const XPO: &str = include_str!("carriers/xpo.json");

/// Parse all built-in carrier documents.
///
/// Panics only if the embedded JSON is malformed, which is a build defect
/// caught by this crate's tests.
pub fn builtin_catalog() -> Vec<Value> {
    [ESTES, XPO]
        .iter()
        .map(|src| serde_json::from_str(src).expect("embedded carrier catalogue is valid JSON"))
        .collect()
}
