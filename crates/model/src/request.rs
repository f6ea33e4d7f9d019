use serde::{Deserialize, Serialize};

/// A request that starts one exchange with the agent.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user message, already trimmed.
    pub message: String,
    /// The session identity from a previous exchange, if any.
    pub session_id: Option<String>,
}

impl ChatRequest {
    /// Creates a request with the given message and session identity.
    #[inline]
    pub fn new<S: Into<String>>(message: S, session_id: Option<String>) -> Self {
        Self {
            message: message.into(),
            session_id,
        }
    }
}
