use std::fmt::{self, Display};

/// The kind of error that occurred during an exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request never reached the agent, or no status was received.
    Connect,
    /// The agent responded with a non-success HTTP status.
    Status(u16),
    /// Reading the response stream failed, or it ended prematurely.
    Stream,
    /// The agent stopped producing events for too long.
    Timeout,
    /// Any other errors.
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Connect => write!(f, "Connection error"),
            ErrorKind::Status(code) => write!(f, "HTTP status {code}"),
            ErrorKind::Stream => write!(f, "Stream error"),
            ErrorKind::Timeout => write!(f, "Timed out"),
            ErrorKind::Other => write!(f, "Other error"),
        }
    }
}
