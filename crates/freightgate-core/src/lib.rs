//! freightgate-core: carrier integration engine for LTL freight
//!
//! A configuration-driven gateway that speaks to heterogeneous freight
//! carrier APIs (Estes, XPO) through one uniform pipeline. Endpoint
//! descriptors live in catalogue documents, request bodies are produced by
//! merging caller payloads into per-endpoint templates, and shipment status
//! is kept fresh by a background poller.
//!
//! The request pipeline for every body-carrying operation:
//!
//! ```text
//! lookup -> validate -> normalize -> merge -> clean -> encode -> dispatch
//! ```
//!
//! Adding a carrier means adding a catalogue document (and, if the carrier
//! needs structural preconditions, a validation rule set); the engine itself
//! has no per-carrier branches.

pub mod clean;
pub mod config;
pub mod correlate;
pub mod duration;
pub mod encode;
pub mod error;
pub mod gateway;
pub mod http;
pub mod merge;
pub mod normalize;
pub mod poller;
pub mod ratelimit;
pub mod registry;
pub mod schema;
pub mod status;
pub mod store;
pub mod types;
pub mod validate;

pub use config::GatewayConfig;
pub use correlate::{extract_correlation_keys, CorrelationKeys};
pub use error::{Error, Result};
pub use gateway::CarrierGateway;
pub use http::{CarrierTransport, HttpTransport, PreparedRequest};
pub use poller::{CycleSummary, PollerHandle, StatusPoller};
pub use ratelimit::{CarrierRateLimiter, RateLimitConfig};
pub use registry::EndpointRegistry;
pub use status::{map_history_response, ShipmentStatus};
pub use store::{MemoryOrderStore, OrderStore};
pub use types::{CarrierToken, EndpointConfig, ShipmentOrder};
