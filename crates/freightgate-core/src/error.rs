//! Error types for the freightgate core library
//!
//! One taxonomy covers the whole gateway: caller-input problems, carrier
//! rejections, and internal faults. Every variant maps onto an HTTP status
//! through [`Error::status_code`] so the REST layer never invents its own.

use thiserror::Error;

/// Main error type for gateway operations
#[derive(Error, Debug)]
pub enum Error {
    /// Caller input malformed, or a carrier-specific structural precondition
    /// was not met. Raised before any network call.
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Missing/invalid caller bearer token, or the carrier rejected
    /// credentials.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Unknown carrier, unknown operation for that carrier, or unknown
    /// order id.
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Unique-key violation, e.g. a duplicate tracking number.
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Non-2xx carrier response, network failure, or response-parse failure.
    /// Carries the normalized message and the carrier's status where it was
    /// meaningful.
    #[error("Carrier error: {message}")]
    Carrier {
        message: String,
        status_code: Option<u16>,
    },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Catalogue/configuration errors surfaced at load time
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic internal error with context
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for a validation failure on a named field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a not-found failure.
    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound {
            message: message.into(),
        }
    }

    /// HTTP status the REST surface should answer with.
    ///
    /// Carrier errors keep the carrier's own status where one was observed;
    /// network-level failures with no status become 502.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation { .. } => 400,
            Error::Authentication { .. } => 401,
            Error::NotFound { .. } => 404,
            Error::Conflict { .. } => 409,
            Error::Carrier { status_code, .. } => status_code.unwrap_or(502),
            Error::Json { .. } => 400,
            Error::Configuration { .. } | Error::Io { .. } | Error::Internal { .. } => 500,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: Some(err),
        }
    }
}
