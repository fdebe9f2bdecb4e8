//! Authentication module
//!
//! Supports: None, Basic, Bearer, Custom Headers
//!
//! The `Authenticator` converts an `AuthConfig` into the default headers of a
//! session. They are applied once at session construction and persist across
//! every request sent through that session.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::AuthConfig;

#[cfg(test)]
mod tests;
