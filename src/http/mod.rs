//! HTTP session module
//!
//! Provides the resilient session every request of the client goes through.
//!
//! # Features
//!
//! - **Automatic Retries**: configurable attempts and status forcelist
//! - **Exponential Backoff**: `backoff_factor * 2^(attempt - 1)` seconds, no jitter
//! - **Retry-After**: honoured for 413/429/503 responses
//! - **Authentication**: headers from the auth module, applied once per session

mod retry;
mod session;
mod timeout;

pub use retry::{
    validate_backoff_factor, validate_max_attempts, validate_status_forcelist, RetryPolicy,
    DEFAULT_BACKOFF_FACTOR, DEFAULT_BACKOFF_MAX, DEFAULT_MAX_ATTEMPTS, DEFAULT_STATUS_FORCELIST,
};
pub use session::{HttpSession, RequestConfig, Session, SessionBuilder};
pub use timeout::Timeout;
