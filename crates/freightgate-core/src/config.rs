//! Environment-driven gateway configuration
//!
//! Reads a `.env` file when present, then the process environment. Carrier
//! base URLs and API keys stay in the environment and are consumed by the
//! endpoint registry through `${ENV:VAR}` placeholders; this module only
//! checks they exist and gathers the runtime knobs.

use std::time::Duration;

use crate::duration::parse_duration;
use crate::error::{Error, Result};
use crate::ratelimit::RateLimitConfig;

/// Environment variables each carrier needs before its endpoints resolve.
const REQUIRED_CARRIER_VARS: &[&str] = &[
    "ESTES_BASE_URL",
    "ESTES_API_KEY",
    "XPO_BASE_URL",
    "XPO_API_KEY",
];

/// Runtime settings for the gateway and the status poller.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Interval between status-poll cycles.
    pub status_update_interval: Duration,
    /// Per-request HTTP timeout.
    pub http_timeout: Duration,
    /// Maximum concurrent orders per poll cycle.
    pub poll_workers: usize,
    /// Outbound per-carrier throttle.
    pub rate_limit: RateLimitConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            status_update_interval: Duration::from_secs(300),
            http_timeout: Duration::from_secs(30),
            poll_workers: 4,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a `.env` file (if any) and the environment.
    ///
    /// Missing carrier variables are a warning, not an error: the registry
    /// expands them to empty strings and only the affected carrier breaks.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        for var in REQUIRED_CARRIER_VARS {
            if std::env::var(var).map(|v| v.trim().is_empty()).unwrap_or(true) {
                tracing::warn!(var, "carrier environment variable is not set");
            }
        }

        let mut config = Self::default();

        if let Ok(raw) = std::env::var("STATUS_UPDATE_INTERVAL") {
            config.status_update_interval = parse_duration(&raw)?;
        }
        if let Ok(raw) = std::env::var("HTTP_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| Error::Configuration {
                message: format!("invalid HTTP_TIMEOUT_SECS: {raw:?}"),
                source: None,
            })?;
            config.http_timeout = Duration::from_secs(secs.max(1));
        }
        if let Ok(raw) = std::env::var("STATUS_POLL_WORKERS") {
            let workers: usize = raw.trim().parse().map_err(|_| Error::Configuration {
                message: format!("invalid STATUS_POLL_WORKERS: {raw:?}"),
                source: None,
            })?;
            config.poll_workers = workers.max(1);
        }

        Ok(config)
    }
}
