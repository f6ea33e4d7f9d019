use std::fmt::{self, Debug};
use std::time::Duration;

use agent_chat_model::AgentTransport;
use tokio::sync::{mpsc, oneshot};

use super::builder::{ErrorFn, IdleFn, UpdateFn};
use super::exchange::{Exchange, Progress};
use super::{ChatSessionBuilder, SessionSnapshot, SubmitOutcome};
use crate::error::ExchangeError;
use crate::reducer::{Applied, StreamingTranscriptReducer};

pub(super) enum Command {
    Submit {
        text: String,
        reply: oneshot::Sender<SubmitOutcome>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
}

impl Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Submit { text, .. } => f
                .debug_struct("Submit")
                .field("text", text)
                .finish_non_exhaustive(),
            Command::Snapshot { .. } => {
                f.debug_struct("Snapshot").finish_non_exhaustive()
            }
        }
    }
}

pub(super) struct SessionState<T: AgentTransport> {
    transport: T,
    reducer: StreamingTranscriptReducer,
    exchange: Option<Exchange<T>>,
    idle_timeout: Option<Duration>,
    on_update: Option<UpdateFn>,
    on_error: Option<ErrorFn>,
    on_idle: Option<IdleFn>,
}

impl<T: AgentTransport + 'static> SessionState<T> {
    pub fn from_builder(builder: ChatSessionBuilder<T>) -> Self {
        Self {
            transport: builder.transport,
            reducer: StreamingTranscriptReducer::new(),
            exchange: None,
            idle_timeout: builder.idle_timeout,
            on_update: builder.on_update,
            on_error: builder.on_error,
            on_idle: builder.on_idle,
        }
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Submit { text, reply } => {
                let outcome = self.submit(&text);
                reply.send(outcome).ok();
            }
            Command::Snapshot { reply } => {
                reply.send(self.snapshot()).ok();
            }
        }
    }

    fn submit(&mut self, text: &str) -> SubmitOutcome {
        let req = match self.reducer.submit(text) {
            Ok(req) => req,
            Err(rejection) => {
                debug!("submission rejected: {rejection}");
                return SubmitOutcome::Rejected(rejection);
            }
        };
        // Observers see both new turns before anything goes out.
        self.notify_update();

        self.exchange =
            Some(Exchange::open(&self.transport, &req, self.idle_timeout));
        SubmitOutcome::Accepted
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            transcript: self.reducer.transcript().clone(),
            session_id: self.reducer.session_id().map(ToOwned::to_owned),
            stage: self.reducer.stage(),
        }
    }

    #[inline]
    fn has_exchange(&self) -> bool {
        self.exchange.is_some()
    }

    async fn next_progress(&mut self) -> Option<Progress<T::Error>> {
        match &mut self.exchange {
            Some(exchange) => Some(exchange.next_progress().await),
            None => None,
        }
    }

    fn handle_progress(&mut self, progress: Progress<T::Error>) {
        match progress {
            Progress::Opened => {
                trace!("response started");
                self.reducer.response_started();
            }
            Progress::Event(event) => match self.reducer.apply(event) {
                Applied::Updated => self.notify_update(),
                Applied::Completed => {
                    self.exchange = None;
                    debug!("exchange completed");
                    self.notify_update();
                    self.notify_idle();
                }
                Applied::Ignored => {}
            },
            Progress::Ended => {
                self.fail_exchange(ExchangeError::incomplete());
            }
            Progress::Failed(err) => {
                error!("exchange failed: {err}");
                self.fail_exchange(ExchangeError::from_transport(&err));
            }
            Progress::TimedOut => {
                let timeout = self
                    .exchange
                    .as_ref()
                    .and_then(Exchange::idle_timeout)
                    .unwrap_or_default();
                self.fail_exchange(ExchangeError::timed_out(timeout));
            }
        }
    }

    fn fail_exchange(&mut self, err: ExchangeError) {
        self.exchange = None;
        if let Some(turn) = self.reducer.fail() {
            debug!("discarded assistant turn {}", turn.id());
        }
        self.notify_update();
        if let Some(on_error) = &self.on_error {
            on_error(&err);
        }
        self.notify_idle();
    }

    #[inline]
    fn notify_update(&self) {
        if let Some(on_update) = &self.on_update {
            on_update(self.reducer.transcript());
        }
    }

    #[inline]
    fn notify_idle(&self) {
        if let Some(on_idle) = &self.on_idle {
            on_idle();
        }
    }
}

pub(super) async fn run_session<T: AgentTransport + 'static>(
    mut state: SessionState<T>,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
) {
    debug!("started");
    loop {
        tokio::select! {
            biased;
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else {
                    break;
                };
                trace!("received command: {cmd:?}");
                state.handle_command(cmd);
            }
            Some(progress) = state.next_progress(), if state.has_exchange() => {
                state.handle_progress(progress);
            }
        }
    }
    debug!("will terminate");
}
