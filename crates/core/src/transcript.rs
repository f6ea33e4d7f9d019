//! Transcript-related types.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Identifies a turn for its whole lifetime.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TurnId(Uuid);

impl TurnId {
    #[inline]
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Identifies a tool invocation. The agent never supplies one, so it is
/// always generated on this side.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct InvocationId(Uuid);

impl InvocationId {
    #[inline]
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Who authored a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person typing.
    User,
    /// The remote agent.
    Assistant,
}

/// Progress of a tool invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    /// Reserved for a two-phase tool-call/tool-result protocol. The
    /// current event stream never produces it.
    Pending,
    /// The agent started the tool and the exchange is still streaming.
    Running,
    /// The exchange that started the tool has finished.
    Completed,
}

/// A record of the agent using a tool during an exchange.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub(crate) id: InvocationId,
    pub(crate) name: String,
    pub(crate) args: Map<String, Value>,
    pub(crate) status: ToolStatus,
}

impl ToolInvocation {
    #[inline]
    pub(crate) fn running(name: String, args: Map<String, Value>) -> Self {
        Self {
            id: InvocationId::new(),
            name,
            args,
            status: ToolStatus::Running,
        }
    }

    /// Returns the identifier of this invocation.
    #[inline]
    pub fn id(&self) -> InvocationId {
        self.id
    }

    /// Returns the tool name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the arguments the agent passed to the tool.
    #[inline]
    pub fn args(&self) -> &Map<String, Value> {
        &self.args
    }

    /// Returns the current status.
    #[inline]
    pub fn status(&self) -> ToolStatus {
        self.status
    }
}

/// A turn of the conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub(crate) id: TurnId,
    pub(crate) role: Role,
    pub(crate) content: String,
    pub(crate) tool_invocations: Vec<ToolInvocation>,
}

impl ConversationTurn {
    #[inline]
    pub(crate) fn user(content: &str) -> Self {
        Self {
            id: TurnId::new(),
            role: Role::User,
            content: content.to_owned(),
            tool_invocations: vec![],
        }
    }

    #[inline]
    pub(crate) fn assistant() -> Self {
        Self {
            id: TurnId::new(),
            role: Role::Assistant,
            content: String::new(),
            tool_invocations: vec![],
        }
    }

    /// Returns the identifier of this turn.
    #[inline]
    pub fn id(&self) -> TurnId {
        self.id
    }

    /// Returns who authored this turn.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the text received so far.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the tools the agent used in this turn, in arrival order.
    /// Always empty for user turns.
    #[inline]
    pub fn tool_invocations(&self) -> &[ToolInvocation] {
        &self.tool_invocations
    }
}

/// An ordered list of turns.
///
/// At most one turn is receiving events at any time, and it is always
/// the last one.
#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<ConversationTurn>,
}

impl Transcript {
    /// Returns all turns in order.
    #[inline]
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Returns the number of turns.
    #[inline]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns `true` if there are no turns yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Returns the most recent turn.
    #[inline]
    pub fn last(&self) -> Option<&ConversationTurn> {
        self.turns.last()
    }

    /// Finds a turn by its identifier.
    pub fn get(&self, id: TurnId) -> Option<&ConversationTurn> {
        self.turns.iter().rev().find(|t| t.id == id)
    }

    #[inline]
    pub(crate) fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    pub(crate) fn get_mut(&mut self, id: TurnId) -> Option<&mut ConversationTurn> {
        // The turn being streamed is the last one, search from the back.
        self.turns.iter_mut().rev().find(|t| t.id == id)
    }

    pub(crate) fn remove(&mut self, id: TurnId) -> Option<ConversationTurn> {
        let idx = self.turns.iter().rposition(|t| t.id == id)?;
        Some(self.turns.remove(idx))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_lookup_and_remove() {
        let mut transcript = Transcript::default();
        let user = ConversationTurn::user("Hi");
        let assistant = ConversationTurn::assistant();
        let (user_id, assistant_id) = (user.id(), assistant.id());
        transcript.push(user);
        transcript.push(assistant);

        assert_ne!(user_id, assistant_id);
        assert_eq!(transcript.get(user_id).unwrap().content(), "Hi");
        assert_eq!(transcript.last().unwrap().role(), Role::Assistant);

        transcript.get_mut(assistant_id).unwrap().content.push_str("Yo");
        assert_eq!(transcript.get(assistant_id).unwrap().content(), "Yo");

        let removed = transcript.remove(assistant_id).unwrap();
        assert_eq!(removed.id(), assistant_id);
        assert_eq!(transcript.len(), 1);
        assert!(transcript.remove(assistant_id).is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let mut turn = ConversationTurn::assistant();
        turn.tool_invocations.push(ToolInvocation::running(
            "identify_icp".to_owned(),
            Map::new(),
        ));
        let value = serde_json::to_value(&turn).unwrap();
        assert_eq!(value["role"], json!("assistant"));
        assert_eq!(value["tool_invocations"][0]["status"], json!("running"));
        assert!(value["id"].is_string());
    }
}
