//! Per-attempt request timeout
//!
//! A `(connect, read)` pair of positive seconds. Each HTTP attempt, retries
//! included, gets a fresh budget. Values too large for a `Duration` saturate.

use crate::error::{Error, Result};
use crate::types::{json_type_name, JsonValue};
use std::fmt;
use std::time::Duration;

/// Connect and read timeout, in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timeout {
    connect_secs: f64,
    read_secs: f64,
    connect: Duration,
    read: Duration,
}

impl Timeout {
    /// The `(60, 60)` default
    pub const DEFAULT: Timeout = Timeout {
        connect_secs: 60.0,
        read_secs: 60.0,
        connect: Duration::from_secs(60),
        read: Duration::from_secs(60),
    };

    /// Create a validated timeout
    pub fn new(connect: f64, read: f64) -> Result<Self> {
        for value in [connect, read] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::invalid_timeout(format!(
                    "Timeout values must be greater than 0, got {value}"
                )));
            }
        }
        Ok(Self {
            connect_secs: connect,
            read_secs: read,
            connect: saturating_duration(connect),
            read: saturating_duration(read),
        })
    }

    /// Create a timeout from a slice that must hold exactly two values
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        match values {
            [connect, read] => Self::new(*connect, *read),
            _ => Err(Error::invalid_timeout(format!(
                "Timeout must be a pair of length 2, got length {}",
                values.len()
            ))),
        }
    }

    /// Validate a raw configuration value such as `[60, 30.5]`
    pub fn from_value(value: &JsonValue) -> Result<Self> {
        let JsonValue::Array(items) = value else {
            return Err(Error::invalid_timeout(format!(
                "Timeout must be a (connect, read) pair, got {}",
                json_type_name(value)
            )));
        };
        if items.len() != 2 {
            return Err(Error::invalid_timeout(format!(
                "Timeout must be a pair of length 2, got length {}",
                items.len()
            )));
        }

        let mut seconds = [0.0; 2];
        for (index, item) in items.iter().enumerate() {
            seconds[index] = item.as_f64().ok_or_else(|| {
                Error::invalid_timeout(format!(
                    "Timeout values must be numbers, but value at index {index} is {}",
                    json_type_name(item)
                ))
            })?;
        }
        Self::from_slice(&seconds)
    }

    /// Connect timeout in seconds
    pub fn connect_secs(&self) -> f64 {
        self.connect_secs
    }

    /// Read timeout in seconds
    pub fn read_secs(&self) -> f64 {
        self.read_secs
    }

    pub fn connect(&self) -> Duration {
        self.connect
    }

    pub fn read(&self) -> Duration {
        self.read
    }

    /// Total budget of one attempt (connect + read)
    pub fn total(&self) -> Duration {
        self.connect.saturating_add(self.read)
    }
}

fn saturating_duration(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
}

impl Default for Timeout {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<(f64, f64)> for Timeout {
    type Error = Error;

    fn try_from((connect, read): (f64, f64)) -> Result<Self> {
        Self::new(connect, read)
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.connect_secs, self.read_secs)
    }
}
