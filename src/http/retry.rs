//! Retry policy for the resilient session
//!
//! Exponential backoff with no jitter: attempt `n` (1-based) that fails with a
//! retryable status or a transient connection error waits
//! `backoff_factor * 2^(n - 1)` seconds before attempt `n + 1`.

use crate::error::{Error, Result};
use crate::types::{json_type_name, JsonValue};
use reqwest::Method;
use std::collections::BTreeSet;
use std::time::Duration;

/// Default total number of attempts per request
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default multiplier of the exponential backoff, in seconds
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

/// Status codes retried by default
pub const DEFAULT_STATUS_FORCELIST: [u16; 5] = [429, 500, 502, 503, 504];

/// Upper bound of any single backoff delay
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(120);

/// Statuses whose `Retry-After` header is honoured
const RETRY_AFTER_STATUS_CODES: [u16; 3] = [413, 429, 503];

/// Immutable retry configuration of a session
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_factor: f64,
    status_forcelist: BTreeSet<u16>,
    backoff_max: Duration,
    respect_retry_after: bool,
    allowed_methods: Vec<Method>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            status_forcelist: DEFAULT_STATUS_FORCELIST.into_iter().collect(),
            backoff_max: DEFAULT_BACKOFF_MAX,
            respect_retry_after: true,
            allowed_methods: default_allowed_methods(),
        }
    }
}

fn default_allowed_methods() -> Vec<Method> {
    vec![
        Method::GET,
        Method::HEAD,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
        Method::TRACE,
    ]
}

impl RetryPolicy {
    /// Create a validated retry policy
    ///
    /// `max_attempts` counts the first attempt, so `1` disables retries.
    pub fn new(
        max_attempts: u32,
        backoff_factor: f64,
        status_forcelist: impl IntoIterator<Item = u16>,
    ) -> Result<Self> {
        if max_attempts == 0 {
            return Err(Error::invalid_retry(
                "max_attempts must be a positive integer, got 0",
            ));
        }
        if !backoff_factor.is_finite() || backoff_factor <= 0.0 {
            return Err(Error::invalid_backoff_factor(format!(
                "backoff_factor must be a positive number, got {backoff_factor}"
            )));
        }

        let mut codes = BTreeSet::new();
        for code in status_forcelist {
            if !(100..=599).contains(&code) {
                return Err(Error::invalid_status_forcelist(format!(
                    "status_forcelist entries must be HTTP status codes, got {code}"
                )));
            }
            codes.insert(code);
        }

        Ok(Self {
            max_attempts,
            backoff_factor,
            status_forcelist: codes,
            ..Self::default()
        })
    }

    /// Cap every single delay at `backoff_max`
    #[must_use]
    pub fn with_backoff_max(mut self, backoff_max: Duration) -> Self {
        self.backoff_max = backoff_max;
        self
    }

    /// Honour (or ignore) the `Retry-After` header of 413/429/503 responses
    #[must_use]
    pub fn with_respect_retry_after(mut self, respect: bool) -> Self {
        self.respect_retry_after = respect;
        self
    }

    /// Replace the methods eligible for status-based retries
    #[must_use]
    pub fn with_allowed_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.allowed_methods = methods.into_iter().collect();
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff_factor(&self) -> f64 {
        self.backoff_factor
    }

    pub fn status_forcelist(&self) -> &BTreeSet<u16> {
        &self.status_forcelist
    }

    pub fn backoff_max(&self) -> Duration {
        self.backoff_max
    }

    pub fn respect_retry_after(&self) -> bool {
        self.respect_retry_after
    }

    pub fn allowed_methods(&self) -> &[Method] {
        &self.allowed_methods
    }

    /// Check if a status code is in the forcelist
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.status_forcelist.contains(&status)
    }

    /// Check if a response with `status` to a `method` request should be retried
    pub fn should_retry_status(&self, method: &Method, status: u16) -> bool {
        self.is_retryable_status(status) && self.allowed_methods.contains(method)
    }

    /// Backoff delay after the failed attempt `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(64) as i32;
        let seconds = self.backoff_factor * 2f64.powi(exponent);
        let capped = seconds.min(self.backoff_max.as_secs_f64());
        Duration::try_from_secs_f64(capped).map_or(self.backoff_max, |d| d.min(self.backoff_max))
    }

    /// Delay before retrying a response with `status`
    ///
    /// A server supplied `Retry-After` replaces the computed backoff when the
    /// policy honours it for that status.
    pub fn delay_for(&self, attempt: u32, status: u16, retry_after: Option<Duration>) -> Duration {
        match retry_after {
            Some(delay)
                if self.respect_retry_after && RETRY_AFTER_STATUS_CODES.contains(&status) =>
            {
                delay.min(self.backoff_max)
            }
            _ => self.backoff(attempt),
        }
    }
}

// ============================================================================
// Raw value validation (configuration files)
// ============================================================================

/// Validate a raw `max_attempts` value
pub fn validate_max_attempts(value: &JsonValue) -> Result<u32> {
    let attempts = match value {
        JsonValue::Number(n) if n.is_u64() => n.as_u64().unwrap_or_default(),
        JsonValue::Number(n) if n.is_i64() => {
            return Err(Error::invalid_retry(format!(
                "max_attempts must be a positive integer, got {n}"
            )));
        }
        other => {
            return Err(Error::invalid_retry(format!(
                "max_attempts must be an integer, got {}",
                json_type_name(other)
            )));
        }
    };

    if attempts == 0 {
        return Err(Error::invalid_retry(
            "max_attempts must be a positive integer, got 0",
        ));
    }
    u32::try_from(attempts)
        .map_err(|_| Error::invalid_retry(format!("max_attempts is too large: {attempts}")))
}

/// Validate a raw `backoff_factor` value (integers are coerced)
pub fn validate_backoff_factor(value: &JsonValue) -> Result<f64> {
    let factor = value.as_f64().ok_or_else(|| {
        Error::invalid_backoff_factor(format!(
            "backoff_factor must be a number, got {}",
            json_type_name(value)
        ))
    })?;

    if !factor.is_finite() || factor <= 0.0 {
        return Err(Error::invalid_backoff_factor(format!(
            "backoff_factor must be a positive number, got {factor}"
        )));
    }
    Ok(factor)
}

/// Validate a raw `status_forcelist` value
pub fn validate_status_forcelist(value: &JsonValue) -> Result<Vec<u16>> {
    let JsonValue::Array(items) = value else {
        return Err(Error::invalid_status_forcelist(format!(
            "status_forcelist must be a list of integers, got {}",
            json_type_name(value)
        )));
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_u64()
                .and_then(|code| u16::try_from(code).ok())
                .ok_or_else(|| {
                    Error::invalid_status_forcelist(format!(
                        "status_forcelist entries must be integers, but value at index {index} is {item}"
                    ))
                })
        })
        .collect()
}
