//! Folds the events of an exchange into the transcript.

use std::fmt::{self, Display};

use agent_chat_model::{AgentEvent, ChatRequest, ToolCallEvent};
use serde::{Deserialize, Serialize};

use crate::transcript::{
    ConversationTurn, ToolInvocation, ToolStatus, Transcript, TurnId,
};

/// Where the current exchange is.
///
/// A finished exchange, successful or not, always brings the reducer
/// back to `Idle`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum ExchangeStage {
    /// Ready for the next submission.
    #[default]
    Idle,
    /// The request is out, no response yet.
    AwaitingFirstByte,
    /// Events are arriving.
    Streaming,
}

/// Why a submission was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SubmitRejection {
    /// The text is empty after trimming.
    Empty,
    /// Another exchange has not finished yet.
    InFlight,
}

impl Display for SubmitRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitRejection::Empty => write!(f, "message is empty"),
            SubmitRejection::InFlight => {
                write!(f, "another exchange is in flight")
            }
        }
    }
}

/// The effect of applying one event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Applied {
    /// The in-progress turn changed.
    Updated,
    /// The exchange is complete and its turn is now immutable.
    Completed,
    /// There was no exchange to apply the event to.
    Ignored,
}

/// A transport-free state machine that maintains the transcript of a
/// conversation with the agent.
///
/// It is driven in three steps per exchange: [`submit`] opens it and
/// yields the request to send, every decoded event is then passed to
/// [`apply`], and a transport failure is reported with [`fail`].
///
/// The reducer never performs I/O, so callers decide how events are
/// delivered. It only guarantees that a second exchange cannot start
/// before the first one has finished.
///
/// [`submit`]: StreamingTranscriptReducer::submit
/// [`apply`]: StreamingTranscriptReducer::apply
/// [`fail`]: StreamingTranscriptReducer::fail
#[derive(Clone, Default, Debug)]
pub struct StreamingTranscriptReducer {
    transcript: Transcript,
    session_id: Option<String>,
    stage: ExchangeStage,
    in_progress: Option<TurnId>,
}

impl StreamingTranscriptReducer {
    /// Creates a reducer with an empty transcript and no session.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new exchange.
    ///
    /// On success, a user turn with the trimmed text and an empty
    /// assistant turn have been appended, and the returned request must
    /// be sent to the agent. A rejected submission leaves everything
    /// untouched.
    pub fn submit(&mut self, text: &str) -> Result<ChatRequest, SubmitRejection> {
        if self.in_progress.is_some() {
            return Err(SubmitRejection::InFlight);
        }
        let message = text.trim();
        if message.is_empty() {
            return Err(SubmitRejection::Empty);
        }

        self.transcript.push(ConversationTurn::user(message));
        let placeholder = ConversationTurn::assistant();
        self.in_progress = Some(placeholder.id());
        self.transcript.push(placeholder);
        self.stage = ExchangeStage::AwaitingFirstByte;
        debug!("exchange started, {} turn(s)", self.transcript.len());

        Ok(ChatRequest::new(message, self.session_id.clone()))
    }

    /// Records that the agent accepted the request.
    #[inline]
    pub fn response_started(&mut self) {
        if self.stage == ExchangeStage::AwaitingFirstByte {
            self.stage = ExchangeStage::Streaming;
        }
    }

    /// Applies one event to the in-progress turn.
    pub fn apply(&mut self, event: AgentEvent) -> Applied {
        let Some(id) = self.in_progress else {
            trace!("no exchange in flight, ignoring {event:?}");
            return Applied::Ignored;
        };
        self.stage = ExchangeStage::Streaming;

        let turn = self
            .transcript
            .get_mut(id)
            .expect("in-progress turn has been removed");
        match event {
            AgentEvent::Text(content) => {
                turn.content.push_str(&content);
                Applied::Updated
            }
            AgentEvent::ToolCall(ToolCallEvent { name, args }) => {
                trace!("tool started: {name}");
                turn.tool_invocations
                    .push(ToolInvocation::running(name, args));
                Applied::Updated
            }
            AgentEvent::Done { session_id } => {
                // Completion is never reported per tool, finishing the
                // turn finishes all of them.
                for invocation in &mut turn.tool_invocations {
                    invocation.status = ToolStatus::Completed;
                }
                if let Some(session_id) =
                    session_id.filter(|id| !id.is_empty())
                {
                    debug!("adopting session {session_id}");
                    self.session_id = Some(session_id);
                }
                self.in_progress = None;
                self.stage = ExchangeStage::Idle;
                Applied::Completed
            }
        }
    }

    /// Aborts the current exchange.
    ///
    /// The assistant turn is removed from the transcript entirely, even
    /// if it already received some text, and returned to the caller.
    pub fn fail(&mut self) -> Option<ConversationTurn> {
        let id = self.in_progress.take()?;
        self.stage = ExchangeStage::Idle;
        self.transcript.remove(id)
    }

    /// Returns the transcript.
    #[inline]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Returns the session identity, if the agent has supplied one.
    #[inline]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Returns the stage of the current exchange.
    #[inline]
    pub fn stage(&self) -> ExchangeStage {
        self.stage
    }

    /// Returns `true` if an exchange has started and not finished yet.
    #[inline]
    pub fn is_in_flight(&self) -> bool {
        self.in_progress.is_some()
    }

    /// Returns the turn currently receiving events.
    #[inline]
    pub fn in_progress(&self) -> Option<&ConversationTurn> {
        self.in_progress.and_then(|id| self.transcript.get(id))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, json};

    use super::*;
    use crate::transcript::Role;

    fn tool_call(name: &str) -> AgentEvent {
        let mut args = Map::new();
        args.insert("product".to_owned(), json!("Acme CRM"));
        AgentEvent::ToolCall(ToolCallEvent {
            name: name.to_owned(),
            args,
        })
    }

    #[test]
    fn test_submit_appends_two_turns() {
        let mut reducer = StreamingTranscriptReducer::new();
        let req = reducer.submit("  Position my product \n").unwrap();
        assert_eq!(req, ChatRequest::new("Position my product", None));

        let turns = reducer.transcript().turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role(), Role::User);
        assert_eq!(turns[0].content(), "Position my product");
        assert_eq!(turns[1].role(), Role::Assistant);
        assert_eq!(turns[1].content(), "");
        assert_eq!(reducer.in_progress().unwrap().id(), turns[1].id());
        assert_eq!(reducer.stage(), ExchangeStage::AwaitingFirstByte);
    }

    #[test]
    fn test_rejections() {
        let mut reducer = StreamingTranscriptReducer::new();
        assert_eq!(reducer.submit(""), Err(SubmitRejection::Empty));
        assert_eq!(reducer.submit(" \t\n"), Err(SubmitRejection::Empty));
        assert!(reducer.transcript().is_empty());
        assert_eq!(reducer.stage(), ExchangeStage::Idle);

        reducer.submit("first").unwrap();
        assert_eq!(reducer.submit("second"), Err(SubmitRejection::InFlight));
        assert_eq!(reducer.transcript().len(), 2);
    }

    #[test]
    fn test_text_concatenation() {
        let mut reducer = StreamingTranscriptReducer::new();
        reducer.submit("Hi").unwrap();
        reducer.response_started();
        assert_eq!(reducer.stage(), ExchangeStage::Streaming);

        assert_eq!(reducer.apply(AgentEvent::Text("Hel".to_owned())), Applied::Updated);
        assert_eq!(reducer.apply(AgentEvent::Text("lo".to_owned())), Applied::Updated);
        assert_eq!(
            reducer.apply(AgentEvent::Done { session_id: None }),
            Applied::Completed
        );

        assert_eq!(reducer.transcript().last().unwrap().content(), "Hello");
        assert_eq!(reducer.stage(), ExchangeStage::Idle);
        assert!(!reducer.is_in_flight());
    }

    #[test]
    fn test_tools_complete_with_the_turn() {
        let mut reducer = StreamingTranscriptReducer::new();
        reducer.submit("Analyze competitors").unwrap();
        reducer.apply(tool_call("search_competitors"));
        reducer.apply(tool_call("analyze_pricing"));

        let turn = reducer.in_progress().unwrap();
        assert_eq!(turn.tool_invocations().len(), 2);
        assert!(
            turn.tool_invocations()
                .iter()
                .all(|t| t.status() == ToolStatus::Running)
        );
        assert_ne!(
            turn.tool_invocations()[0].id(),
            turn.tool_invocations()[1].id()
        );

        reducer.apply(AgentEvent::Done { session_id: None });
        let turn = reducer.transcript().last().unwrap();
        assert_eq!(turn.tool_invocations()[0].name(), "search_competitors");
        assert_eq!(
            turn.tool_invocations()[0].args().get("product"),
            Some(&json!("Acme CRM"))
        );
        assert!(
            turn.tool_invocations()
                .iter()
                .all(|t| t.status() == ToolStatus::Completed)
        );
        assert_eq!(reducer.session_id(), None);
    }

    #[test]
    fn test_session_identity() {
        let mut reducer = StreamingTranscriptReducer::new();
        reducer.submit("one").unwrap();
        reducer.apply(AgentEvent::Done {
            session_id: Some("abc".to_owned()),
        });
        assert_eq!(reducer.session_id(), Some("abc"));

        let req = reducer.submit("two").unwrap();
        assert_eq!(req.session_id.as_deref(), Some("abc"));
        // A `done` without identity keeps the current one.
        reducer.apply(AgentEvent::Done { session_id: None });
        assert_eq!(reducer.session_id(), Some("abc"));

        reducer.submit("three").unwrap();
        reducer.apply(AgentEvent::Done {
            session_id: Some("def".to_owned()),
        });
        assert_eq!(reducer.session_id(), Some("def"));
    }

    #[test]
    fn test_failure_discards_placeholder() {
        let mut reducer = StreamingTranscriptReducer::new();
        reducer.submit("Hi").unwrap();
        reducer.apply(AgentEvent::Text("partial".to_owned()));

        let discarded = reducer.fail().unwrap();
        assert_eq!(discarded.content(), "partial");
        assert_eq!(reducer.transcript().len(), 1);
        assert_eq!(reducer.transcript().last().unwrap().role(), Role::User);
        assert_eq!(reducer.stage(), ExchangeStage::Idle);
        assert!(reducer.fail().is_none());

        // Ready for a resubmission.
        assert!(reducer.submit("Hi").is_ok());
    }

    #[test]
    fn test_events_outside_exchange() {
        let mut reducer = StreamingTranscriptReducer::new();
        assert_eq!(
            reducer.apply(AgentEvent::Text("stray".to_owned())),
            Applied::Ignored
        );
        reducer.submit("Hi").unwrap();
        reducer.apply(AgentEvent::Done { session_id: None });
        assert_eq!(
            reducer.apply(AgentEvent::Text("late".to_owned())),
            Applied::Ignored
        );
        assert_eq!(reducer.transcript().last().unwrap().content(), "");
    }
}
