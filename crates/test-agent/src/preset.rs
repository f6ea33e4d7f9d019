use agent_chat_model::{AgentEvent, ToolCallEvent};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The events in a preset exchange.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "text")]
    Text(String),
    #[serde(rename = "tool_call")]
    ToolCall(ToolCallEvent),
}

impl PresetEvent {
    /// Creates a text event.
    #[inline]
    pub fn text<S: Into<String>>(content: S) -> Self {
        PresetEvent::Text(content.into())
    }

    /// Creates a tool call event. Non-object `args` are replaced by an
    /// empty map.
    #[inline]
    pub fn tool_call<S: Into<String>>(name: S, args: Value) -> Self {
        let args = match args {
            Value::Object(args) => args,
            _ => Map::new(),
        };
        PresetEvent::ToolCall(ToolCallEvent {
            name: name.into(),
            args,
        })
    }
}

impl From<PresetEvent> for AgentEvent {
    #[inline]
    fn from(event: PresetEvent) -> Self {
        match event {
            PresetEvent::Text(content) => AgentEvent::Text(content),
            PresetEvent::ToolCall(tool_call) => AgentEvent::ToolCall(tool_call),
        }
    }
}

/// How a preset exchange ends after its events are delivered.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetEnding {
    /// Emits `done`, carrying the preset session identity.
    #[default]
    Done,
    /// The stream fails with a read error.
    Disconnect,
    /// The stream closes without `done`.
    Eof,
    /// The agent never sends anything again.
    Stall,
    /// The request is refused with the given status, no event is
    /// delivered at all.
    Reject(u16),
}

/// The preset for one exchange.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetExchange {
    /// Events in this exchange.
    pub events: Vec<PresetEvent>,
    /// The session identity sent with `done`.
    pub session_id: Option<String>,
    /// How the exchange ends.
    #[serde(default)]
    pub ending: PresetEnding,
}

impl PresetExchange {
    /// Creates a `PresetExchange` with the specified events, ending with
    /// `done` and no session identity.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            session_id: None,
            ending: PresetEnding::Done,
        }
    }

    /// Sets the session identity sent with `done`.
    #[inline]
    pub fn with_session_id<S: Into<String>>(mut self, session_id: S) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Sets how the exchange ends.
    #[inline]
    pub fn with_ending(mut self, ending: PresetEnding) -> Self {
        self.ending = ending;
        self
    }
}
