//! Authenticator implementation
//!
//! Turns an `AuthConfig` into the headers a session sends with every request.
//! The headers are computed once, when the session is built.

use super::types::AuthConfig;
use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use tracing::debug;

/// Authenticator produces the authentication headers for a session
#[derive(Debug, Clone, Default)]
pub struct Authenticator {
    config: AuthConfig,
}

impl Authenticator {
    /// Create a new authenticator with the given config
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Get the auth config
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Build the headers this strategy attaches to every request
    ///
    /// Secrets are marked sensitive so they never show up in `Debug` output
    /// of the header map.
    pub fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        match &self.config {
            AuthConfig::None => {}

            AuthConfig::Basic { username, password } => {
                let credentials = STANDARD.encode(format!("{username}:{password}"));
                headers.insert(
                    AUTHORIZATION,
                    sensitive_value(&format!("Basic {credentials}"))?,
                );
            }

            AuthConfig::Bearer { token } => {
                if token.is_empty() {
                    return Err(Error::invalid_session("bearer token cannot be empty"));
                }
                headers.insert(AUTHORIZATION, sensitive_value(&format!("Bearer {token}"))?);
            }

            AuthConfig::CustomHeaders { headers: custom } => {
                for (key, value) in custom {
                    let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
                        Error::invalid_session(format!("invalid header name '{key}': {e}"))
                    })?;
                    headers.insert(name, sensitive_value(value)?);
                }
            }
        }

        debug!(
            auth = self.config.kind(),
            header_count = headers.len(),
            "Authentication headers prepared"
        );
        Ok(headers)
    }
}

fn sensitive_value(value: &str) -> Result<HeaderValue> {
    let mut header = HeaderValue::from_str(value)
        .map_err(|e| Error::invalid_session(format!("invalid authentication header value: {e}")))?;
    header.set_sensitive(true);
    Ok(header)
}
