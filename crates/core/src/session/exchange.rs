use std::future::poll_fn;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use agent_chat_model::{AgentEvent, AgentResponse, AgentTransport, ChatRequest};
use tokio::time::{Sleep, sleep};

type OpenFuture<T> = Pin<
    Box<
        dyn Future<
                Output = Result<
                    <T as AgentTransport>::Response,
                    <T as AgentTransport>::Error,
                >,
            > + Send,
    >,
>;

enum Phase<T: AgentTransport> {
    Opening(OpenFuture<T>),
    Streaming(Pin<Box<T::Response>>),
}

/// Something that moved the exchange forward.
#[derive(Debug)]
pub(super) enum Progress<E> {
    Opened,
    Event(AgentEvent),
    /// The stream has ended without a `done` event.
    Ended,
    Failed(E),
    TimedOut,
}

/// The single request in flight, from opening to the last event.
///
/// Dropping it cancels the request.
pub(super) struct Exchange<T: AgentTransport> {
    phase: Phase<T>,
    idle_timeout: Option<Duration>,
    deadline: Option<Pin<Box<Sleep>>>,
}

impl<T: AgentTransport + 'static> Exchange<T> {
    pub fn open(
        transport: &T,
        req: &ChatRequest,
        idle_timeout: Option<Duration>,
    ) -> Self {
        Self {
            phase: Phase::Opening(Box::pin(transport.send_request(req))),
            idle_timeout,
            deadline: None,
        }
    }

    /// Waits for the next progress. Cancel safe.
    pub async fn next_progress(&mut self) -> Progress<T::Error> {
        poll_fn(|cx| self.poll_progress(cx)).await
    }

    fn poll_progress(&mut self, cx: &mut Context<'_>) -> Poll<Progress<T::Error>> {
        let poll = match &mut self.phase {
            Phase::Opening(fut) => match fut.as_mut().poll(cx) {
                Poll::Ready(Ok(resp)) => Poll::Ready(Ok(resp)),
                Poll::Ready(Err(err)) => Poll::Ready(Err(Progress::Failed(err))),
                Poll::Pending => Poll::Pending,
            },
            Phase::Streaming(resp) => match resp.as_mut().poll_next_event(cx) {
                Poll::Ready(Ok(Some(event))) => {
                    Poll::Ready(Err(Progress::Event(event)))
                }
                Poll::Ready(Ok(None)) => Poll::Ready(Err(Progress::Ended)),
                Poll::Ready(Err(err)) => Poll::Ready(Err(Progress::Failed(err))),
                Poll::Pending => Poll::Pending,
            },
        };

        match poll {
            Poll::Ready(result) => {
                // Any progress restarts the silence window.
                self.deadline = None;
                let progress = match result {
                    Ok(resp) => {
                        self.phase = Phase::Streaming(Box::pin(resp));
                        Progress::Opened
                    }
                    Err(progress) => progress,
                };
                Poll::Ready(progress)
            }
            Poll::Pending => {
                let Some(timeout) = self.idle_timeout else {
                    return Poll::Pending;
                };
                let deadline = self
                    .deadline
                    .get_or_insert_with(|| Box::pin(sleep(timeout)));
                if deadline.as_mut().poll(cx).is_ready() {
                    warn!("no progress in {timeout:?}");
                    return Poll::Ready(Progress::TimedOut);
                }
                Poll::Pending
            }
        }
    }

    #[inline]
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout
    }
}
