//! Logger collaborator of the client
//!
//! A client either logs through the process-wide `tracing` subscriber or
//! through its own dispatcher, scoped to its construction and every fetch.

use crate::error::{Error, Result};
use crate::types::LogLevel;
use std::future::Future;
use tracing::instrument::WithSubscriber;
use tracing::Dispatch;
use tracing_subscriber::EnvFilter;

/// Where a client sends its log events
#[derive(Debug, Clone, Default)]
pub enum Logger {
    /// Whatever subscriber is installed for the process (silent if none)
    #[default]
    Global,
    /// A caller supplied dispatcher
    Dispatch(Dispatch),
}

impl Logger {
    /// Build a stderr logger from `EnvFilter` directives such as `odyn=debug`
    pub fn from_filter(directives: &str) -> Result<Self> {
        let directives = directives.trim();
        if directives.is_empty() {
            return Err(Error::invalid_logger("log filter cannot be empty"));
        }

        let filter = EnvFilter::try_new(directives).map_err(|e| {
            Error::invalid_logger(format!("invalid log filter '{directives}': {e}"))
        })?;
        Ok(Self::Dispatch(stderr_dispatch(filter)))
    }

    /// Build a stderr logger emitting `level` and above
    pub fn from_level(level: LogLevel) -> Self {
        Self::Dispatch(stderr_dispatch(EnvFilter::new(level.as_directive())))
    }

    /// Check if this logger defers to the process-wide subscriber
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global)
    }

    /// Run `f` with this logger as the active subscriber
    pub(crate) fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        match self {
            Self::Global => f(),
            Self::Dispatch(dispatch) => tracing::dispatcher::with_default(dispatch, f),
        }
    }

    /// Drive `future` with this logger as the active subscriber
    pub(crate) async fn scope<F: Future>(&self, future: F) -> F::Output {
        match self {
            Self::Global => future.await,
            Self::Dispatch(dispatch) => future.with_subscriber(dispatch.clone()).await,
        }
    }
}

impl From<Dispatch> for Logger {
    fn from(dispatch: Dispatch) -> Self {
        Self::Dispatch(dispatch)
    }
}

fn stderr_dispatch(filter: EnvFilter) -> Dispatch {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    Dispatch::new(subscriber)
}
