//! Resilient HTTP session
//!
//! Wraps a pooled `reqwest::Client` and transparently retries:
//! - responses whose status is in the retry policy's forcelist
//! - connection failures and timeouts
//!
//! Once attempts are exhausted the last response is returned (or the last
//! transport error raised) unmodified; raising on 4xx/5xx is the caller's job.

use super::retry::RetryPolicy;
use super::timeout::Timeout;
use crate::auth::{AuthConfig, Authenticator};
use crate::error::{Error, Result};
use crate::types::{QueryParams, StringMap};
use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

/// Capability of a session usable by the paginating client
#[async_trait]
pub trait HttpSession: Send + Sync + fmt::Debug {
    /// Send a request with retries applied
    async fn send(&self, method: Method, url: &str, config: RequestConfig) -> Result<Response>;

    /// Retry configuration in effect for every request
    fn retry_policy(&self) -> &RetryPolicy;
}

/// Configuration for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters, appended in order
    pub query: QueryParams,
    /// Request headers
    pub headers: StringMap,
    /// Per-attempt timeout
    pub timeout: Option<Timeout>,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Merge a set of headers
    #[must_use]
    pub fn headers(mut self, headers: &StringMap) -> Self {
        self.headers
            .extend(headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Set timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Timeout) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// HTTP session with retry and authentication
pub struct Session {
    client: Client,
    retry: RetryPolicy,
    authenticator: Authenticator,
    connect_timeout: Duration,
}

impl Session {
    /// Create a session builder
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    /// Unauthenticated session with the default retry policy
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Session sending HTTP Basic credentials
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        Self::builder()
            .auth(AuthConfig::basic(username, password))
            .build()
    }

    /// Session sending `Authorization: Bearer <token>`
    pub fn bearer(token: impl Into<String>) -> Result<Self> {
        Self::builder().auth(AuthConfig::bearer(token)).build()
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Authentication strategy of this session
    pub fn auth(&self) -> &AuthConfig {
        self.authenticator.config()
    }

    /// Connection establishment timeout of the pooled client
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

#[async_trait]
impl HttpSession for Session {
    async fn send(&self, method: Method, url: &str, config: RequestConfig) -> Result<Response> {
        let url = parse_http_url(url)?;
        let max_attempts = self.retry.max_attempts();
        let mut attempt = 1;

        loop {
            let mut req = self.client.request(method.clone(), url.clone());

            for (key, value) in &config.headers {
                req = req.header(key.as_str(), value.as_str());
            }
            if !config.query.is_empty() {
                req = req.query(&config.query);
            }
            if let Some(timeout) = config.timeout {
                req = req.timeout(timeout.total());
            }

            debug!(%method, %url, attempt, max_attempts, "Sending HTTP request");

            match req.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();

                    if attempt < max_attempts && self.retry.should_retry_status(&method, status) {
                        let delay =
                            self.retry
                                .delay_for(attempt, status, extract_retry_after(&response));
                        warn!(
                            status,
                            attempt,
                            max_attempts,
                            url = %url,
                            "Retryable status, retrying in {:?}",
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    if self.retry.is_retryable_status(status) && attempt > 1 {
                        warn!(status, attempts = attempt, url = %url, "Retries exhausted");
                    }
                    debug!(status, attempt, url = %url, "HTTP response received");
                    return Ok(response);
                }
                Err(e) => {
                    if attempt < max_attempts && is_transient(&e) {
                        let delay = self.retry.backoff(attempt);
                        warn!(
                            error = %e,
                            attempt,
                            max_attempts,
                            url = %url,
                            "Transient transport error, retrying in {:?}",
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    error!(error = %e, attempts = attempt, url = %url, "HTTP request failed");
                    return Err(Error::Http(e));
                }
            }
        }
    }

    fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("retry", &self.retry)
            .field("auth", &self.authenticator.config().kind())
            .field("connect_timeout", &self.connect_timeout)
            .finish_non_exhaustive()
    }
}

/// Builder for `Session`
#[derive(Debug)]
pub struct SessionBuilder {
    max_attempts: u32,
    backoff_factor: f64,
    status_forcelist: Vec<u16>,
    backoff_max: Duration,
    respect_retry_after: bool,
    allowed_methods: Option<Vec<Method>>,
    auth: AuthConfig,
    connect_timeout: Duration,
    user_agent: String,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            max_attempts: retry.max_attempts(),
            backoff_factor: retry.backoff_factor(),
            status_forcelist: retry.status_forcelist().iter().copied().collect(),
            backoff_max: retry.backoff_max(),
            respect_retry_after: retry.respect_retry_after(),
            allowed_methods: None,
            auth: AuthConfig::None,
            connect_timeout: Timeout::DEFAULT.connect(),
            user_agent: format!("odyn/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl SessionBuilder {
    /// Total attempts per request, first attempt included
    #[must_use]
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Multiplier of the exponential backoff, in seconds
    #[must_use]
    pub fn backoff_factor(mut self, backoff_factor: f64) -> Self {
        self.backoff_factor = backoff_factor;
        self
    }

    /// Status codes that trigger a retry
    #[must_use]
    pub fn status_forcelist(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.status_forcelist = codes.into_iter().collect();
        self
    }

    /// Upper bound of a single backoff delay
    #[must_use]
    pub fn backoff_max(mut self, backoff_max: Duration) -> Self {
        self.backoff_max = backoff_max;
        self
    }

    /// Honour `Retry-After` on 413/429/503 responses
    #[must_use]
    pub fn respect_retry_after(mut self, respect: bool) -> Self {
        self.respect_retry_after = respect;
        self
    }

    /// Methods eligible for status-based retries
    #[must_use]
    pub fn allowed_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.allowed_methods = Some(methods.into_iter().collect());
        self
    }

    /// Copy every setting of an existing retry policy
    #[must_use]
    pub fn retry_policy(mut self, policy: &RetryPolicy) -> Self {
        self.max_attempts = policy.max_attempts();
        self.backoff_factor = policy.backoff_factor();
        self.status_forcelist = policy.status_forcelist().iter().copied().collect();
        self.backoff_max = policy.backoff_max();
        self.respect_retry_after = policy.respect_retry_after();
        self.allowed_methods = Some(policy.allowed_methods().to_vec());
        self
    }

    /// Set the authentication strategy
    #[must_use]
    pub fn auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    /// Shorthand for Basic authentication
    #[must_use]
    pub fn basic_auth(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth(AuthConfig::basic(username, password))
    }

    /// Shorthand for Bearer authentication
    #[must_use]
    pub fn bearer_auth(self, token: impl Into<String>) -> Self {
        self.auth(AuthConfig::bearer(token))
    }

    /// Connection establishment timeout of the pooled client
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set user agent
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Validate the settings and build the session
    pub fn build(self) -> Result<Session> {
        let mut retry = RetryPolicy::new(
            self.max_attempts,
            self.backoff_factor,
            self.status_forcelist,
        )?
        .with_backoff_max(self.backoff_max)
        .with_respect_retry_after(self.respect_retry_after);
        if let Some(methods) = self.allowed_methods {
            retry = retry.with_allowed_methods(methods);
        }

        let authenticator = Authenticator::new(self.auth);
        let client = Client::builder()
            .default_headers(authenticator.headers()?)
            .user_agent(&self.user_agent)
            .connect_timeout(self.connect_timeout)
            .build()
            .map_err(|e| Error::invalid_session(format!("failed to build HTTP client: {e}")))?;

        info!(
            max_attempts = retry.max_attempts(),
            backoff_factor = retry.backoff_factor(),
            status_forcelist = ?retry.status_forcelist(),
            auth = authenticator.config().kind(),
            "HTTP session created"
        );

        Ok(Session {
            client,
            retry,
            authenticator,
            connect_timeout: self.connect_timeout,
        })
    }
}

/// Parse a URL, accepting only the schemes the session serves
fn parse_http_url(url: &str) -> Result<Url> {
    let parsed =
        Url::parse(url).map_err(|e| Error::invalid_url(format!("cannot parse '{url}': {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(Error::invalid_url(format!(
            "no HTTP adapter for scheme '{other}' in '{url}'"
        ))),
    }
}

/// Connection-level failures worth another attempt
fn is_transient(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}

/// Extract a numeric `Retry-After` header value
fn extract_retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
