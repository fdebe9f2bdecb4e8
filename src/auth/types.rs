//! Auth configuration types
//!
//! These types represent the runtime auth configuration after template
//! interpolation has been applied.

use std::collections::HashMap;
use std::fmt;

const REDACTED: &str = "***";

/// Authentication strategy attached to a session
#[derive(Clone, Default, PartialEq, Eq)]
pub enum AuthConfig {
    /// No authentication; callers pre-populate headers themselves
    #[default]
    None,

    /// HTTP Basic authentication
    Basic {
        /// Username
        username: String,
        /// Password
        password: String,
    },

    /// Bearer token authentication
    Bearer {
        /// The bearer token
        token: String,
    },

    /// Custom headers sent with every request
    CustomHeaders {
        /// Headers to add to each request
        headers: HashMap<String, String>,
    },
}

impl AuthConfig {
    /// Create a basic auth config
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Create a bearer auth config
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    /// Short name of the strategy, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            AuthConfig::None => "none",
            AuthConfig::Basic { .. } => "basic",
            AuthConfig::Bearer { .. } => "bearer",
            AuthConfig::CustomHeaders { .. } => "custom_headers",
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthConfig::None => f.write_str("None"),
            AuthConfig::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &REDACTED)
                .finish(),
            AuthConfig::Bearer { .. } => f.debug_struct("Bearer").field("token", &REDACTED).finish(),
            AuthConfig::CustomHeaders { headers } => {
                let mut names: Vec<&String> = headers.keys().collect();
                names.sort();
                f.debug_struct("CustomHeaders")
                    .field("headers", &names)
                    .finish()
            }
        }
    }
}
