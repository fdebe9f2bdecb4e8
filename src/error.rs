//! Error types for odyn
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for odyn
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Invalid URL: {message}")]
    InvalidUrl { message: String },

    #[error("Invalid session: {message}")]
    InvalidSession { message: String },

    #[error("Invalid timeout: {message}")]
    InvalidTimeout { message: String },

    #[error("Invalid logger: {message}")]
    InvalidLogger { message: String },

    #[error("Invalid retry configuration: {message}")]
    InvalidRetry { message: String },

    #[error("Invalid backoff factor: {message}")]
    InvalidBackoffFactor { message: String },

    #[error("Invalid status forcelist: {message}")]
    InvalidStatusForcelist { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Undefined variable in template: {variable}")]
    UndefinedVariable { variable: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}: {body}")]
    HttpStatus {
        status: u16,
        url: String,
        body: String,
    },

    // ============================================================================
    // Response Errors
    // ============================================================================
    #[error("Failed to decode JSON from response of {url}: {source}")]
    JsonDecode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid OData response: {message}")]
    InvalidResponse { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an invalid URL error
    pub fn invalid_url(message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            message: message.into(),
        }
    }

    /// Create an invalid session error
    pub fn invalid_session(message: impl Into<String>) -> Self {
        Self::InvalidSession {
            message: message.into(),
        }
    }

    /// Create an invalid timeout error
    pub fn invalid_timeout(message: impl Into<String>) -> Self {
        Self::InvalidTimeout {
            message: message.into(),
        }
    }

    /// Create an invalid logger error
    pub fn invalid_logger(message: impl Into<String>) -> Self {
        Self::InvalidLogger {
            message: message.into(),
        }
    }

    /// Create an invalid retry error
    pub fn invalid_retry(message: impl Into<String>) -> Self {
        Self::InvalidRetry {
            message: message.into(),
        }
    }

    /// Create an invalid backoff factor error
    pub fn invalid_backoff_factor(message: impl Into<String>) -> Self {
        Self::InvalidBackoffFactor {
            message: message.into(),
        }
    }

    /// Create an invalid status forcelist error
    pub fn invalid_status_forcelist(message: impl Into<String>) -> Self {
        Self::InvalidStatusForcelist {
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an undefined variable error
    pub fn undefined_var(variable: impl Into<String>) -> Self {
        Self::UndefinedVariable {
            variable: variable.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, url: impl Into<String>, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            url: url.into(),
            body: body.into(),
        }
    }

    /// Create a JSON decode error for a response body
    pub fn json_decode(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::JsonDecode {
            url: url.into(),
            source,
        }
    }

    /// Create an invalid response (envelope shape) error
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Check if this error was raised while validating construction inputs
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidUrl { .. }
                | Error::InvalidSession { .. }
                | Error::InvalidTimeout { .. }
                | Error::InvalidLogger { .. }
                | Error::InvalidRetry { .. }
                | Error::InvalidBackoffFactor { .. }
                | Error::InvalidStatusForcelist { .. }
                | Error::Config { .. }
                | Error::UndefinedVariable { .. }
        )
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::HttpStatus { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this error is a transient transport failure
    ///
    /// Shape and configuration errors are never retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}

/// Result type alias for odyn
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_url("URL cannot be empty");
        assert_eq!(err.to_string(), "Invalid URL: URL cannot be empty");

        let err = Error::http_status(404, "https://api.example.com/items", "Not found");
        assert_eq!(
            err.to_string(),
            "HTTP 404 for https://api.example.com/items: Not found"
        );

        let err = Error::invalid_response("OData response missing 'value' list.");
        assert_eq!(
            err.to_string(),
            "Invalid OData response: OData response missing 'value' list."
        );
    }

    #[test]
    fn test_is_config_error() {
        assert!(Error::invalid_url("x").is_config_error());
        assert!(Error::invalid_session("x").is_config_error());
        assert!(Error::invalid_timeout("x").is_config_error());
        assert!(Error::invalid_logger("x").is_config_error());
        assert!(Error::invalid_retry("x").is_config_error());
        assert!(Error::invalid_backoff_factor("x").is_config_error());
        assert!(Error::invalid_status_forcelist("x").is_config_error());

        assert!(!Error::http_status(500, "u", "").is_config_error());
        assert!(!Error::invalid_response("x").is_config_error());
    }

    #[test]
    fn test_status() {
        assert_eq!(Error::http_status(503, "u", "").status(), Some(503));
        assert_eq!(Error::invalid_response("x").status(), None);
    }

    #[test]
    fn test_shape_errors_not_retryable() {
        assert!(!Error::invalid_response("x").is_retryable());
        assert!(!Error::http_status(500, "u", "").is_retryable());
        assert!(!Error::invalid_url("x").is_retryable());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
