// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]

//! # Odyn
//!
//! A client for Microsoft Dynamics 365 Business Central OData V4 APIs.
//!
//! ## Features
//!
//! - **Resilient Session**: retries on transient status codes and connection
//!   failures with exponential backoff
//! - **Authentication**: Basic, Bearer or custom headers, applied once per session
//! - **Transparent Pagination**: follows `@odata.nextLink` and returns every
//!   record of every page in order
//! - **YAML Config**: clients described in a file, with `{{ env.NAME }}`
//!   placeholders for secrets
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use odyn::{Odyn, RequestConfig, Result, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let session = Session::basic("user", "web-service-key")?;
//!     let client = Odyn::new(
//!         "https://bc.example.com/ODataV4/Company('CRONUS')/",
//!         session,
//!     )?;
//!
//!     let config = RequestConfig::new().query("$filter", "blocked eq ' '");
//!     let customers = client.get_with_config("customers", config).await?;
//!     println!("{} customers", customers.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                 Odyn::get(endpoint)                    │
//! │  build_url → fetch page → check envelope → next link   │
//! └────────────────────────────────────────────────────────┘
//!                            │
//! ┌──────────────┬───────────┴────────┬────────────────────┐
//! │     Auth     │      Session       │     Pagination     │
//! ├──────────────┼────────────────────┼────────────────────┤
//! │ Basic        │ Retry forcelist    │ value envelope     │
//! │ Bearer       │ Backoff            │ @odata.nextLink    │
//! │ Headers      │ Retry-After        │ Page state         │
//! └──────────────┴────────────────────┴────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Authentication strategies
pub mod auth;

/// HTTP session with retry and backoff
pub mod http;

/// OData V4 paging
pub mod pagination;

/// The paginating client
pub mod client;

/// YAML client configuration
pub mod config;

/// Template interpolation
pub mod template;

// ============================================================================
// Re-exports
// ============================================================================

pub use auth::AuthConfig;
pub use client::{Logger, Odyn, OdynBuilder};
pub use config::OdynConfig;
pub use error::{Error, Result};
pub use http::{HttpSession, RequestConfig, RetryPolicy, Session, SessionBuilder, Timeout};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
