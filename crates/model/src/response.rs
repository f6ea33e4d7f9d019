use std::pin::Pin;
use std::task::{self, Poll};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::transport::TransportError;

/// A streamed response from the agent.
pub trait AgentResponse: Sized + Send + 'static {
    /// The error type that may be returned by the transport.
    type Error: TransportError;

    /// Attempts to pull out the next event from the response.
    ///
    /// # Return value
    ///
    /// There are several possible return values, each indicating a
    /// distinct response state:
    ///
    /// - `Poll::Pending` means that this response is still waiting for
    ///   the next event. Implementations will ensure that the current
    ///   task will be notified when the next event may be ready.
    /// - `Poll::Ready(Ok(Some(event)))` means the response has an event
    ///   to deliver, and may produce further events on subsequent
    ///   `poll_next_event` calls.
    /// - `Poll::Ready(Ok(None))` means the underlying stream has ended.
    ///   An exchange is only complete if [`AgentEvent::Done`] was
    ///   delivered before; callers treat an end without it as a failure.
    /// - `Poll::Ready(Err(error))` means an error occurred while
    ///   reading the response.
    ///
    /// Implementations must stop producing events after delivering
    /// [`AgentEvent::Done`], and calling this method after completion
    /// should always return `None`.
    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<AgentEvent>, Self::Error>>;
}

/// Describes a tool the agent has started using.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallEvent {
    /// The tool identifier. This is an open set.
    pub name: String,
    /// The arguments of the call, opaque to the client.
    pub args: Map<String, Value>,
}

/// An event from an agent response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentEvent {
    /// Received a text fragment of the assistant message.
    Text(String),
    /// The agent invoked a tool.
    ToolCall(ToolCallEvent),
    /// The exchange has been completed.
    Done {
        /// The session identity to use for subsequent requests.
        session_id: Option<String>,
    },
}

impl AgentEvent {
    /// Returns `true` if this event terminates the exchange.
    #[inline]
    pub fn is_done(&self) -> bool {
        matches!(self, AgentEvent::Done { .. })
    }
}
