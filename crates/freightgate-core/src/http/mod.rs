//! HTTP transport for carrier API communication
//!
//! This module provides:
//! - A `CarrierTransport` trait so the gateway and poller can be exercised
//!   against scripted doubles
//! - `HttpTransport`, the reqwest implementation with a mandatory per-request
//!   timeout
//! - Error normalization turning heterogeneous carrier error bodies into a
//!   single human-readable message

pub mod error;
pub mod transport;

pub use error::normalize_error_body;
pub use transport::{CarrierTransport, HttpTransport, PreparedRequest};
