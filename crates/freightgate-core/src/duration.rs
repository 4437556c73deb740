//! Human-readable duration strings
//!
//! Operators set polling intervals as compact strings like `5m` or `1h`.
//! Bare numbers are taken as seconds.

use std::time::Duration;

use crate::error::{Error, Result};

/// Parse a duration string: integer plus optional `s`, `m`, `h`, or `d`
/// suffix. Whitespace and case are ignored.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let text = input.trim().to_ascii_lowercase();
    if text.is_empty() {
        return Err(Error::Configuration {
            message: "duration string is empty".to_string(),
            source: None,
        });
    }

    let (digits, unit) = match text.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => text.split_at(idx),
        None => (text.as_str(), "s"),
    };

    let value: u64 = digits.parse().map_err(|_| Error::Configuration {
        message: format!("invalid duration: {input:?}"),
        source: None,
    })?;

    let secs = match unit.trim() {
        "s" => Some(value),
        "m" => value.checked_mul(60),
        "h" => value.checked_mul(3600),
        "d" => value.checked_mul(86_400),
        other => {
            return Err(Error::Configuration {
                message: format!("unknown duration unit {other:?} in {input:?}"),
                source: None,
            })
        }
    };
    let secs = secs.ok_or_else(|| Error::Configuration {
        message: format!("duration out of range: {input:?}"),
        source: None,
    })?;

    if secs == 0 {
        return Err(Error::Configuration {
            message: format!("duration must be positive: {input:?}"),
            source: None,
        });
    }
    Ok(Duration::from_secs(secs))
}
