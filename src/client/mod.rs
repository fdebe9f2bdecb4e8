//! Paginating client module
//!
//! `Odyn` validates its construction inputs (logger, base URL, session,
//! timeout), joins endpoints onto the base URL and aggregates OData pages
//! into one ordered result.

mod endpoint;
mod logger;
mod odyn;

pub use endpoint::{build_url, validate_base_url};
pub use logger::Logger;
pub use odyn::{Odyn, OdynBuilder};
