//! Paginating OData client
//!
//! `Odyn::get` hides OData server-driven paging: it requests the first page,
//! then keeps following `@odata.nextLink` until the server omits it, and
//! returns every record of every page in order.

use super::endpoint::{build_url, validate_base_url};
use super::logger::Logger;
use crate::error::{Error, Result};
use crate::http::{HttpSession, RequestConfig, Timeout};
use crate::pagination::{NextPage, PageEnvelope, PaginationState};
use crate::types::{JsonValue, Record};
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Client for a Business Central OData V4 service
#[derive(Debug, Clone)]
pub struct Odyn {
    base_url: String,
    session: Arc<dyn HttpSession>,
    timeout: Timeout,
    logger: Logger,
}

impl Odyn {
    /// Create a client builder
    pub fn builder() -> OdynBuilder {
        OdynBuilder::default()
    }

    /// Create a client with the default timeout and logger
    pub fn new(base_url: impl Into<String>, session: impl HttpSession + 'static) -> Result<Self> {
        Self::builder().base_url(base_url).session(session).build()
    }

    /// Base URL, always ending with `/`
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Per-attempt timeout
    pub fn timeout(&self) -> Timeout {
        self.timeout
    }

    /// Session every request goes through
    pub fn session(&self) -> &Arc<dyn HttpSession> {
        &self.session
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Fetch every record of `endpoint`, following all next links
    pub async fn get(&self, endpoint: &str) -> Result<Vec<Record>> {
        self.get_with_config(endpoint, RequestConfig::default())
            .await
    }

    /// Fetch every record of `endpoint` with query parameters and headers
    ///
    /// Query parameters only apply to the first page; next links already
    /// carry their own query state. A timeout in `config` overrides the
    /// client's.
    pub async fn get_with_config(
        &self,
        endpoint: &str,
        config: RequestConfig,
    ) -> Result<Vec<Record>> {
        self.logger.scope(self.fetch_all(endpoint, config)).await
    }

    /// Fetch every record of `endpoint` and deserialize each into `T`
    pub async fn get_as<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Vec<T>> {
        self.get_as_with_config(endpoint, RequestConfig::default())
            .await
    }

    /// Typed variant of `get_with_config`
    pub async fn get_as_with_config<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        config: RequestConfig,
    ) -> Result<Vec<T>> {
        let records = self.get_with_config(endpoint, config).await?;
        records
            .into_iter()
            .map(|record| serde_json::from_value(record).map_err(Error::from))
            .collect()
    }

    /// Build the full URL of an endpoint
    pub fn build_url(&self, endpoint: &str, params: &[(String, String)]) -> Result<String> {
        let url = build_url(&self.base_url, endpoint, params)?;
        debug!(final_url = %url, "Built request URL");
        Ok(url)
    }

    async fn fetch_all(&self, endpoint: &str, config: RequestConfig) -> Result<Vec<Record>> {
        debug!(endpoint, params = ?config.query, "Initiating GET request with pagination");

        let mut next_url = self.build_url(endpoint, &config.query)?;
        let request = RequestConfig {
            query: Vec::new(),
            headers: config.headers,
            timeout: Some(config.timeout.unwrap_or(self.timeout)),
        };

        let mut items: Vec<Record> = Vec::new();
        let mut state = PaginationState::new();

        while !state.done {
            state.next_page();
            debug!(page = state.page, url = %next_url, "Fetching page");

            let body = self.request(&next_url, request.clone()).await?;
            let envelope = PageEnvelope::from_value(body).inspect_err(|e| {
                error!(error = %e, url = %next_url, "OData response format is invalid");
            })?;
            let next = state.process_page(&envelope, &next_url)?;

            let count = envelope.len();
            items.extend(envelope.value);
            debug!(
                count,
                page = state.page,
                total = state.total_fetched,
                "Fetched {} items from page {}",
                count,
                state.page
            );

            match next {
                NextPage::Continue { url } => {
                    debug!(next_url = %url, "Pagination link found, preparing to fetch next page");
                    next_url = url;
                }
                NextPage::Done => debug!(endpoint, "No more pages found"),
            }
        }

        info!(
            endpoint,
            pages = state.page,
            total = state.total_fetched,
            "Finished fetching all pages"
        );
        Ok(items)
    }

    /// Send one GET and decode the JSON body
    async fn request(&self, url: &str, config: RequestConfig) -> Result<JsonValue> {
        let header_names: Vec<&String> = config.headers.keys().collect();
        debug!(method = "GET", url, headers = ?header_names, "Sending request");

        let response = self
            .session
            .send(Method::GET, url, config)
            .await
            .inspect_err(|e| error!(error = %e, url, "Request failed due to a network error"))?;

        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "Request completed");

        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            error!(
                status = status.as_u16(),
                response_text = %body,
                url,
                "Request failed with HTTP error"
            );
            return Err(Error::http_status(status.as_u16(), url, body));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            error!(error = %e, url, "Failed to decode JSON response");
            Error::json_decode(url, e)
        })
    }
}

impl fmt::Display for Odyn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Odyn(base_url='{}', timeout={})",
            self.base_url, self.timeout
        )
    }
}

/// Timeout as given to the builder, validated at `build`
#[derive(Debug, Clone)]
enum TimeoutInput {
    Pair(f64, f64),
    Raw(JsonValue),
}

/// Builder for `Odyn`
///
/// `build` validates in a fixed order: logger, URL, session, timeout.
#[derive(Debug, Default)]
pub struct OdynBuilder {
    base_url: Option<String>,
    session: Option<Arc<dyn HttpSession>>,
    timeout: Option<TimeoutInput>,
    logger: Logger,
    log_filter: Option<String>,
}

impl OdynBuilder {
    /// Set the base URL of the OData service
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the session
    #[must_use]
    pub fn session(self, session: impl HttpSession + 'static) -> Self {
        self.shared_session(Arc::new(session))
    }

    /// Set a session shared with other clients
    #[must_use]
    pub fn shared_session(mut self, session: Arc<dyn HttpSession>) -> Self {
        self.session = Some(session);
        self
    }

    /// Set the `(connect, read)` timeout in seconds
    #[must_use]
    pub fn timeout(mut self, connect: f64, read: f64) -> Self {
        self.timeout = Some(TimeoutInput::Pair(connect, read));
        self
    }

    /// Set the timeout from a raw configuration value such as `[60, 60]`
    #[must_use]
    pub fn timeout_value(mut self, value: JsonValue) -> Self {
        self.timeout = Some(TimeoutInput::Raw(value));
        self
    }

    /// Set the logger
    #[must_use]
    pub fn logger(mut self, logger: impl Into<Logger>) -> Self {
        self.logger = logger.into();
        self.log_filter = None;
        self
    }

    /// Log to stderr with `EnvFilter` directives, validated at `build`
    #[must_use]
    pub fn log_filter(mut self, directives: impl Into<String>) -> Self {
        self.log_filter = Some(directives.into());
        self
    }

    /// Validate every setting and build the client
    pub fn build(self) -> Result<Odyn> {
        let logger = match &self.log_filter {
            Some(directives) => Logger::from_filter(directives)?,
            None => self.logger.clone(),
        };

        logger.in_scope(|| {
            debug!("Initializing Odyn client...");
            if logger.is_global() {
                debug!("No logger provided, using default logger.");
            } else {
                debug!("Using provided custom logger.");
            }

            let client = self.validate(logger.clone()).inspect_err(|e| {
                error!(error = %e, "Odyn client configuration rejected");
            })?;

            debug!(
                base_url = %client.base_url,
                timeout = %client.timeout,
                "Odyn client initialized successfully."
            );
            Ok(client)
        })
    }

    fn validate(self, logger: Logger) -> Result<Odyn> {
        let base_url = validate_base_url(self.base_url.as_deref().unwrap_or_default())?;
        debug!(url = %base_url, "Base URL validation successful");

        let session = self
            .session
            .ok_or_else(|| Error::invalid_session("a session is required"))?;
        debug!(
            max_attempts = session.retry_policy().max_attempts(),
            "Session validation successful."
        );

        let timeout = match self.timeout {
            None => Timeout::default(),
            Some(TimeoutInput::Pair(connect, read)) => Timeout::new(connect, read)?,
            Some(TimeoutInput::Raw(value)) => Timeout::from_value(&value)?,
        };
        debug!(%timeout, "Timeout validation successful");

        Ok(Odyn {
            base_url,
            session,
            timeout,
            logger,
        })
    }
}
