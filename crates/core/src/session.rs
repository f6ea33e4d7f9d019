mod builder;
mod exchange;
mod state;

use agent_chat_model::AgentTransport;
use tokio::sync::{mpsc, oneshot};
use tracing::Instrument;

use crate::error::SessionClosedError;
use crate::reducer::{ExchangeStage, SubmitRejection};
use crate::transcript::Transcript;
pub use builder::ChatSessionBuilder;
use state::{Command, SessionState};

/// What happened to a submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SubmitOutcome {
    /// The turns were appended and the request has been opened.
    Accepted,
    /// Nothing changed.
    Rejected(SubmitRejection),
}

/// A consistent copy of the session state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// All turns so far.
    pub transcript: Transcript,
    /// The session identity, if the agent has supplied one.
    pub session_id: Option<String>,
    /// The stage of the current exchange.
    pub stage: ExchangeStage,
}

/// A chat session with a remote agent, like a window that displays
/// messages and has an input box.
///
/// The session state lives in a background task, which owns the
/// transcript and the single in-flight exchange. Changes are pushed to
/// the callbacks registered on [`ChatSessionBuilder`], in the order they
/// happen. Each decoded event is applied, and observers are notified,
/// before the next one is read from the transport.
///
/// Handles are cheap to clone. The background task stops, dropping any
/// in-flight exchange, once every handle has been dropped.
#[derive(Clone, Debug)]
pub struct ChatSession {
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl ChatSession {
    /// Submits a user message.
    ///
    /// The message is refused when it is blank, or while a previous
    /// exchange is still streaming. Submissions are never queued.
    pub async fn submit<S: Into<String>>(
        &self,
        text: S,
    ) -> Result<SubmitOutcome, SessionClosedError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Submit {
                text: text.into(),
                reply: reply_tx,
            })
            .map_err(|_| SessionClosedError)?;
        reply_rx.await.map_err(|_| SessionClosedError)
    }

    /// Returns a copy of the current state.
    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionClosedError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Snapshot { reply: reply_tx })
            .map_err(|_| SessionClosedError)?;
        reply_rx.await.map_err(|_| SessionClosedError)
    }
}

impl ChatSession {
    fn spawn_from_builder<T: AgentTransport + 'static>(
        builder: ChatSessionBuilder<T>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let state = SessionState::from_builder(builder);
        tokio::spawn(
            state::run_session(state, cmd_rx)
                .instrument(trace_span!("chat session")),
        );
        Self { cmd_tx }
    }
}
