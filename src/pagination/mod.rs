//! Pagination module
//!
//! OData V4 server-driven paging: every page is an envelope
//! `{ "value": [...], "@odata.nextLink"?: "<url>" }` and the client follows
//! the next link until the server stops sending one.

mod types;

pub use types::{NextPage, PageEnvelope, PaginationState, ODATA_NEXT_LINK, ODATA_VALUE};
