use std::error::Error;
use std::fmt;
use std::time::Duration;

use agent_chat_model::{ErrorKind, TransportError};

/// Why an exchange failed.
///
/// The message is meant to be shown to the user as-is.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExchangeError {
    kind: ErrorKind,
    message: String,
}

impl ExchangeError {
    pub(crate) fn from_transport<E: TransportError>(err: &E) -> Self {
        Self {
            kind: err.kind(),
            message: format!("{err}"),
        }
    }

    pub(crate) fn incomplete() -> Self {
        Self {
            kind: ErrorKind::Stream,
            message: "stream ended before completion".to_owned(),
        }
    }

    pub(crate) fn timed_out(timeout: Duration) -> Self {
        Self {
            kind: ErrorKind::Timeout,
            message: format!("no response from the agent in {timeout:?}"),
        }
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ExchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.message.fmt(f)
    }
}

impl Error for ExchangeError {}

/// A type of error which can be returned whenever a session is used
/// after its background task has stopped.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SessionClosedError;

impl fmt::Debug for SessionClosedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionClosedError").finish()
    }
}

impl fmt::Display for SessionClosedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        "the chat session has closed".fmt(f)
    }
}

impl Error for SessionClosedError {}
