//! Pagination types
//!
//! Defines the OData page envelope and the state tracked across pages.

use crate::error::{Error, Result};
use crate::types::{json_type_name, JsonValue, OptionStringExt, Record};
use url::Url;

/// Field holding the records of a page
pub const ODATA_VALUE: &str = "value";

/// Field holding the URL of the following page
pub const ODATA_NEXT_LINK: &str = "@odata.nextLink";

/// Result of the next page computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// More pages available at this fully qualified URL
    Continue {
        /// URL of the next page, used verbatim
        url: String,
    },
    /// No more pages
    Done,
}

impl NextPage {
    /// Create a continuation with a new URL
    pub fn with_url(url: impl Into<String>) -> Self {
        Self::Continue { url: url.into() }
    }

    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Check if this is a continue result
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue { .. })
    }
}

/// One parsed OData response body
///
/// Other OData metadata fields (`@odata.context`, `@odata.count`, ...) are
/// ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct PageEnvelope {
    /// Records of this page, in server order
    pub value: Vec<Record>,
    /// Next page link, if the server sent a non-empty one
    pub next_link: Option<String>,
}

impl PageEnvelope {
    /// Validate the shape of a response body
    ///
    /// The body must be an object whose `value` is an array. A
    /// `@odata.nextLink` that is `null` or empty ends pagination; any other
    /// non-string is rejected.
    pub fn from_value(body: JsonValue) -> Result<Self> {
        let JsonValue::Object(mut map) = body else {
            return Err(Error::invalid_response(format!(
                "OData response must be a JSON object, got {}",
                json_type_name(&body)
            )));
        };

        let value = match map.remove(ODATA_VALUE) {
            Some(JsonValue::Array(items)) => items,
            Some(other) => {
                return Err(Error::invalid_response(format!(
                    "OData response field '{ODATA_VALUE}' must be a list, got {}",
                    json_type_name(&other)
                )));
            }
            None => {
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                return Err(Error::invalid_response(format!(
                    "OData response missing '{ODATA_VALUE}' list (keys: {keys:?})"
                )));
            }
        };

        let next_link = match map.remove(ODATA_NEXT_LINK) {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::String(link)) => link.none_if_empty(),
            Some(other) => {
                return Err(Error::invalid_response(format!(
                    "OData response field '{ODATA_NEXT_LINK}' must be a string, got {}",
                    json_type_name(&other)
                )));
            }
        };

        Ok(Self { value, next_link })
    }

    /// Number of records on this page
    pub fn len(&self) -> usize {
        self.value.len()
    }

    /// Check if the page carries no records
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Where to go after this page
    ///
    /// Relative links are resolved against the URL that produced the page.
    pub fn next_page(&self, current_url: &str) -> Result<NextPage> {
        let Some(link) = &self.next_link else {
            return Ok(NextPage::Done);
        };

        if Url::parse(link).is_ok() {
            return Ok(NextPage::with_url(link.clone()));
        }

        let base = Url::parse(current_url)
            .map_err(|e| Error::invalid_url(format!("cannot parse '{current_url}': {e}")))?;
        let resolved = base.join(link).map_err(|e| {
            Error::invalid_response(format!("invalid '{ODATA_NEXT_LINK}' value '{link}': {e}"))
        })?;
        Ok(NextPage::with_url(resolved))
    }
}

/// Tracks pagination state during one fetch
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Current page number (1-based once the first page is requested)
    pub page: u32,
    /// Total records fetched so far
    pub total_fetched: u64,
    /// Is pagination complete?
    pub done: bool,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self) {
        self.done = true;
    }

    /// Increment page number
    pub fn next_page(&mut self) {
        self.page += 1;
    }

    /// Add to total fetched
    pub fn add_fetched(&mut self, count: u64) {
        self.total_fetched += count;
    }

    /// Record a received page and decide where to go next
    pub fn process_page(&mut self, envelope: &PageEnvelope, current_url: &str) -> Result<NextPage> {
        self.add_fetched(envelope.len() as u64);

        let next = envelope.next_page(current_url)?;
        if next.is_done() {
            self.mark_done();
        }
        Ok(next)
    }
}
