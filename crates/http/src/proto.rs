use agent_chat_model::{AgentEvent, ChatRequest, ToolCallEvent};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    Text {
        content: String,
    },
    ToolCall {
        name: String,
        #[serde(default)]
        args: Map<String, Value>,
    },
    Done {
        #[serde(default)]
        session_id: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

/// Reply of the agent's health probe.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Health {
    /// `"ok"` when the service is up.
    pub status: String,
    /// The name the agent reports for itself.
    #[serde(default)]
    pub agent: Option<String>,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatStreamRequest<'a> {
    message: &'a str,
    session_id: Option<&'a str>,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(req: &ChatRequest) -> ChatStreamRequest<'_> {
    ChatStreamRequest {
        message: &req.message,
        session_id: req.session_id.as_deref(),
    }
}

/// Decodes the payload of one `data` record.
///
/// Returns `Ok(None)` for frames of an unknown type, which are ignored.
pub fn decode_frame(data: &str) -> Result<Option<AgentEvent>, serde_json::Error> {
    let event = match serde_json::from_str::<Frame>(data)? {
        Frame::Text { content } => AgentEvent::Text(content),
        Frame::ToolCall { name, args } => {
            AgentEvent::ToolCall(ToolCallEvent { name, args })
        }
        Frame::Done { session_id } => AgentEvent::Done {
            // An empty identity is as good as none.
            session_id: session_id.filter(|id| !id.is_empty()),
        },
        Frame::Unknown => return Ok(None),
    };
    Ok(Some(event))
}
