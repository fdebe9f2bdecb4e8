//! YAML client configuration
//!
//! A config file describes one client: base URL, credentials, retry policy,
//! timeout and logging. String values may hold `{{ env.NAME }}` or
//! `{{ vars.name }}` placeholders, rendered before the file is interpreted.
//!
//! ```yaml
//! base_url: "https://{{ env.BC_HOST }}/ODataV4/Company('CRONUS')/"
//! auth:
//!   type: basic
//!   username: "{{ env.BC_USER }}"
//!   password: "{{ env.BC_PASSWORD }}"
//! retry:
//!   max_attempts: 5
//!   backoff_factor: 2.0
//!   status_forcelist: [429, 500, 502, 503, 504]
//! timeout: [60, 60]
//! log_filter: "odyn=debug"
//! ```

use crate::auth::AuthConfig;
use crate::client::{validate_base_url, Logger, Odyn};
use crate::error::{Error, Result, ResultExt};
use crate::http::{
    validate_backoff_factor, validate_max_attempts, validate_status_forcelist, RetryPolicy,
    Session, Timeout, DEFAULT_BACKOFF_FACTOR, DEFAULT_MAX_ATTEMPTS, DEFAULT_STATUS_FORCELIST,
};
use crate::template::{render_value, TemplateContext};
use crate::types::{JsonValue, LogLevel, StringMap};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

// ============================================================================
// Top-Level Client Config
// ============================================================================

/// Complete client configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OdynConfig {
    /// Base URL of the OData service
    pub base_url: String,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfigDef,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfigDef,

    /// `[connect, read]` timeout in seconds, checked when the client is built
    #[serde(default)]
    pub timeout: Option<JsonValue>,

    /// `EnvFilter` directives for a dedicated stderr logger
    #[serde(default)]
    pub log_filter: Option<String>,

    /// Level for a dedicated stderr logger, used when no filter is set
    #[serde(default)]
    pub log_level: Option<LogLevel>,

    /// User-Agent header value
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl OdynConfig {
    /// Parse a config, rendering placeholders from `ctx`
    pub fn from_yaml_str(yaml: &str, ctx: &TemplateContext) -> Result<Self> {
        let raw: JsonValue = serde_yaml::from_str(yaml)?;
        let rendered = render_value(&raw, ctx)?;
        serde_json::from_value(rendered)
            .map_err(|e| Error::config(format!("Failed to parse client config: {e}")))
    }

    /// Read and parse a config file, rendering placeholders from `ctx`
    pub fn from_file(path: impl AsRef<Path>, ctx: &TemplateContext) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        debug!(path = %path.display(), "Loaded client config");
        Self::from_yaml_str(&content, ctx)
    }

    /// Read a config file, rendering placeholders from the process environment
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_file(path, &TemplateContext::from_env())
    }

    /// Logger described by `log_filter` or `log_level`
    pub fn logger(&self) -> Result<Logger> {
        match (&self.log_filter, self.log_level) {
            (Some(filter), _) => Logger::from_filter(filter),
            (None, Some(level)) => Ok(Logger::from_level(level)),
            (None, None) => Ok(Logger::Global),
        }
    }

    /// Build the retrying session described by `auth`, `retry` and `timeout`
    pub fn build_session(&self) -> Result<Session> {
        let policy = self.retry.to_policy()?;
        let mut builder = Session::builder()
            .retry_policy(&policy)
            .auth(self.auth.clone().into());

        // An invalid timeout is reported by the client builder
        if let Some(Ok(timeout)) = self.timeout.as_ref().map(Timeout::from_value) {
            builder = builder.connect_timeout(timeout.connect());
        }
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        builder.build()
    }

    /// Build a client, checking logger, URL, session and timeout in that order
    pub fn build_client(&self) -> Result<Odyn> {
        let logger = self.logger()?;
        validate_base_url(&self.base_url)?;
        let session = self.build_session()?;

        let mut builder = Odyn::builder()
            .logger(logger)
            .base_url(self.base_url.clone())
            .session(session);
        if let Some(timeout) = &self.timeout {
            builder = builder.timeout_value(timeout.clone());
        }
        builder.build()
    }
}

// ============================================================================
// Authentication
// ============================================================================

/// Authentication configuration as written in YAML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfigDef {
    /// No authentication
    #[default]
    None,

    /// Basic authentication
    Basic {
        /// Username (usually a template)
        username: String,
        /// Password (usually a template)
        password: String,
    },

    /// Bearer token authentication
    Bearer {
        /// The token (usually a template)
        token: String,
    },

    /// Custom headers sent with every request
    CustomHeaders {
        /// Header name to value
        headers: StringMap,
    },
}

impl From<AuthConfigDef> for AuthConfig {
    fn from(def: AuthConfigDef) -> Self {
        match def {
            AuthConfigDef::None => AuthConfig::None,
            AuthConfigDef::Basic { username, password } => AuthConfig::Basic { username, password },
            AuthConfigDef::Bearer { token } => AuthConfig::Bearer { token },
            AuthConfigDef::CustomHeaders { headers } => AuthConfig::CustomHeaders { headers },
        }
    }
}

// ============================================================================
// Retry
// ============================================================================

/// Retry configuration as written in YAML
///
/// Values stay raw so wrong types are reported with the retry error kinds
/// rather than a generic parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfigDef {
    /// Total attempts including the first
    pub max_attempts: Option<JsonValue>,
    /// Base of the exponential backoff, in seconds
    pub backoff_factor: Option<JsonValue>,
    /// Status codes that trigger a retry
    pub status_forcelist: Option<JsonValue>,
    /// Upper bound for a single backoff sleep, in seconds
    pub backoff_max_seconds: Option<f64>,
    /// Honour `Retry-After` on 413, 429 and 503
    pub respect_retry_after: Option<bool>,
}

impl RetryConfigDef {
    /// Validate every value and build the policy
    pub fn to_policy(&self) -> Result<RetryPolicy> {
        let max_attempts = match &self.max_attempts {
            Some(value) => validate_max_attempts(value)?,
            None => DEFAULT_MAX_ATTEMPTS,
        };
        let backoff_factor = match &self.backoff_factor {
            Some(value) => validate_backoff_factor(value)?,
            None => DEFAULT_BACKOFF_FACTOR,
        };
        let status_forcelist = match &self.status_forcelist {
            Some(value) => validate_status_forcelist(value)?,
            None => DEFAULT_STATUS_FORCELIST.to_vec(),
        };

        let mut policy = RetryPolicy::new(max_attempts, backoff_factor, status_forcelist)?;
        if let Some(secs) = self.backoff_max_seconds {
            let max = Duration::try_from_secs_f64(secs).map_err(|_| {
                Error::config(format!(
                    "backoff_max_seconds must be a non-negative number, got {secs}"
                ))
            })?;
            policy = policy.with_backoff_max(max);
        }
        if let Some(respect) = self.respect_retry_after {
            policy = policy.with_respect_retry_after(respect);
        }
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::Write;

    fn ctx() -> TemplateContext {
        let mut ctx = TemplateContext::new();
        ctx.set_env(json!({
            "BC_HOST": "bc.example.com",
            "BC_USER": "admin",
            "BC_PASSWORD": "s3cret"
        }));
        ctx.set_vars(json!({"company": "CRONUS", "retries": 3}));
        ctx
    }

    #[test]
    fn test_parse_minimal() {
        let config = OdynConfig::from_yaml_str("base_url: https://bc.example.com/", &ctx()).unwrap();
        assert_eq!(config.base_url, "https://bc.example.com/");
        assert_eq!(config.auth, AuthConfigDef::None);
        assert!(config.timeout.is_none());
        assert!(config.logger().unwrap().is_global());

        let policy = config.retry.to_policy().unwrap();
        assert_eq!(policy, RetryPolicy::default());
    }

    #[test]
    fn test_parse_full_with_templates() {
        let yaml = r#"
base_url: "https://{{ env.BC_HOST }}/ODataV4/Company('{{ company }}')"
auth:
  type: basic
  username: "{{ env.BC_USER }}"
  password: "{{ env.BC_PASSWORD }}"
retry:
  max_attempts: "{{ vars.retries }}"
  backoff_factor: 0.5
  status_forcelist: [503]
  backoff_max_seconds: 10
  respect_retry_after: false
timeout: [5, 30]
log_level: warn
user_agent: "sync-job/1.0"
"#;

        let config = OdynConfig::from_yaml_str(yaml, &ctx()).unwrap();
        assert_eq!(
            config.base_url,
            "https://bc.example.com/ODataV4/Company('CRONUS')"
        );
        assert_eq!(
            config.auth,
            AuthConfigDef::Basic {
                username: "admin".to_string(),
                password: "s3cret".to_string()
            }
        );

        let policy = config.retry.to_policy().unwrap();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.backoff(1), Duration::from_millis(500));
        assert_eq!(policy.backoff_max(), Duration::from_secs(10));
        assert!(policy.is_retryable_status(503));
        assert!(!policy.is_retryable_status(500));
        assert!(!policy.respect_retry_after());

        let odyn = config.build_client().unwrap();
        assert_eq!(
            odyn.base_url(),
            "https://bc.example.com/ODataV4/Company('CRONUS')/"
        );
        assert_eq!(odyn.timeout(), Timeout::new(5.0, 30.0).unwrap());
        assert!(!odyn.logger().is_global());
        assert_eq!(odyn.session().retry_policy(), &policy);
    }

    #[test]
    fn test_parse_auth_variants() {
        let yaml = "base_url: https://x.example.com/\nauth:\n  type: bearer\n  token: abc\n";
        let config = OdynConfig::from_yaml_str(yaml, &ctx()).unwrap();
        assert_eq!(AuthConfig::from(config.auth), AuthConfig::bearer("abc"));

        let yaml = r#"
base_url: https://x.example.com/
auth:
  type: custom_headers
  headers:
    Ocp-Apim-Subscription-Key: key
"#;
        let config = OdynConfig::from_yaml_str(yaml, &ctx()).unwrap();
        let session = config.build_session().unwrap();
        assert_eq!(session.auth().kind(), "custom_headers");
    }

    #[test]
    fn test_undefined_template_variable() {
        let err = OdynConfig::from_yaml_str("base_url: '{{ env.NOPE }}'", &ctx()).unwrap_err();
        assert!(matches!(err, Error::UndefinedVariable { .. }));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = OdynConfig::from_yaml_str("base_url: [unclosed", &ctx()).unwrap_err();
        assert!(matches!(err, Error::YamlParse(_)));
    }

    #[test]
    fn test_missing_base_url() {
        let err = OdynConfig::from_yaml_str("timeout: [1, 1]", &ctx()).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.is_config_error());
    }

    #[test]
    fn test_invalid_retry_values() {
        let yaml = "base_url: https://x.example.com/\nretry:\n  max_attempts: -1\n";
        let config = OdynConfig::from_yaml_str(yaml, &ctx()).unwrap();
        assert!(matches!(
            config.build_session().unwrap_err(),
            Error::InvalidRetry { .. }
        ));

        let yaml = "base_url: https://x.example.com/\nretry:\n  backoff_factor: fast\n";
        let config = OdynConfig::from_yaml_str(yaml, &ctx()).unwrap();
        assert!(matches!(
            config.build_session().unwrap_err(),
            Error::InvalidBackoffFactor { .. }
        ));

        let yaml = "base_url: https://x.example.com/\nretry:\n  status_forcelist: 500\n";
        let config = OdynConfig::from_yaml_str(yaml, &ctx()).unwrap();
        assert!(matches!(
            config.build_session().unwrap_err(),
            Error::InvalidStatusForcelist { .. }
        ));
    }

    #[test]
    fn test_build_client_validation_order() {
        let yaml = "base_url: ''\nlog_filter: 'odyn=loudest'\nretry:\n  max_attempts: 0\n";
        let config = OdynConfig::from_yaml_str(yaml, &ctx()).unwrap();
        assert!(matches!(
            config.build_client().unwrap_err(),
            Error::InvalidLogger { .. }
        ));

        let yaml = "base_url: ''\nretry:\n  max_attempts: 0\n";
        let config = OdynConfig::from_yaml_str(yaml, &ctx()).unwrap();
        assert!(matches!(
            config.build_client().unwrap_err(),
            Error::InvalidUrl { .. }
        ));

        let yaml = "base_url: https://x.example.com/\nretry:\n  max_attempts: 0\ntimeout: [0, 0]\n";
        let config = OdynConfig::from_yaml_str(yaml, &ctx()).unwrap();
        assert!(matches!(
            config.build_client().unwrap_err(),
            Error::InvalidRetry { .. }
        ));

        let yaml = "base_url: https://x.example.com/\ntimeout: [60]\n";
        let config = OdynConfig::from_yaml_str(yaml, &ctx()).unwrap();
        assert!(matches!(
            config.build_client().unwrap_err(),
            Error::InvalidTimeout { .. }
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url: https://{{{{ env.BC_HOST }}}}/odata").unwrap();
        writeln!(file, "timeout: [10, 20]").unwrap();

        let config = OdynConfig::from_file(file.path(), &ctx()).unwrap();
        assert_eq!(config.base_url, "https://bc.example.com/odata");
        assert_eq!(config.timeout, Some(json!([10, 20])));
    }

    #[test]
    fn test_from_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.yaml");
        let err = OdynConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
