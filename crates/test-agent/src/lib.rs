//! A local scripted agent for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use agent_chat_model::{
    AgentEvent, AgentResponse, AgentTransport, ChatRequest, ErrorKind,
    TransportError,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl TransportError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct ScriptedResponse {
    events: VecDeque<PresetEvent>,
    session_id: Option<String>,
    ending: PresetEnding,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
    stalled: bool,
    finished: bool,
}

impl AgentResponse for ScriptedResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<AgentEvent>, Self::Error>> {
        let this = self.get_mut();
        if this.finished {
            // In case this method is called after completion.
            return Poll::Ready(Ok(None));
        }
        if this.stalled {
            return Poll::Pending;
        }

        let delay = this.delay;
        let delay_fut = this.sleep.get_or_insert_with(|| Box::pin(sleep(delay)));
        ready!(delay_fut.as_mut().poll(cx));
        this.sleep = None;

        if let Some(event) = this.events.pop_front() {
            return Poll::Ready(Ok(Some(event.into())));
        }

        match this.ending {
            PresetEnding::Done => {
                this.finished = true;
                Poll::Ready(Ok(Some(AgentEvent::Done {
                    session_id: this.session_id.take(),
                })))
            }
            PresetEnding::Disconnect => {
                this.finished = true;
                Poll::Ready(Err(Error {
                    message: "connection reset by the script",
                    kind: ErrorKind::Stream,
                }))
            }
            PresetEnding::Eof | PresetEnding::Reject(_) => {
                this.finished = true;
                Poll::Ready(Ok(None))
            }
            PresetEnding::Stall => {
                // Never woken again, the caller has to give up on its own.
                this.stalled = true;
                Poll::Pending
            }
        }
    }
}

/// A local scripted agent for testing purpose.
///
/// Before sending requests, you need to setup the script, which is how
/// the agent should respond to each request. Exchanges are consumed in
/// order, one per request. If there are no enough exchanges in the
/// script, an error will be returned.
///
/// Clones share the script and the request log, so a test can keep one
/// clone to inspect what the client sent.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<VecDeque<PresetExchange>>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
    delay: Option<Duration>,
}

impl ScriptedTransport {
    #[inline]
    pub fn add_exchange(&mut self, preset: PresetExchange) {
        lock(&self.script).push_back(preset);
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns every request received so far, in order.
    #[inline]
    pub fn requests(&self) -> Vec<ChatRequest> {
        lock(&self.requests).clone()
    }
}

impl Debug for ScriptedTransport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedTransport")
            .field("remaining", &lock(&self.script).len())
            .field("requests", &lock(&self.requests).len())
            .field("delay", &self.delay)
            .finish()
    }
}

impl AgentTransport for ScriptedTransport {
    type Error = crate::Error;
    type Response = ScriptedResponse;

    fn send_request(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        lock(&self.requests).push(req.clone());

        let result = match lock(&self.script).pop_front() {
            None => Err(Error {
                message: "no enough exchanges",
                kind: ErrorKind::Other,
            }),
            Some(PresetExchange {
                ending: PresetEnding::Reject(status),
                ..
            }) => Err(Error {
                message: "rejected by the script",
                kind: ErrorKind::Status(status),
            }),
            Some(preset) => Ok(ScriptedResponse {
                events: preset.events.into(),
                session_id: preset.session_id,
                ending: preset.ending,
                delay: self.delay.unwrap_or(Duration::from_millis(1)),
                sleep: None,
                stalled: false,
                finished: false,
            }),
        };
        ready(result)
    }
}

#[inline]
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
