use std::pin::Pin;
use std::task::{Context, Poll, ready};

use agent_chat_model::{AgentEvent, AgentResponse, ErrorKind};
use futures_util::future::BoxFuture;
use pin_project_lite::pin_project;

use crate::Error;
use crate::io::{Sse, SseError, SseEvent};
use crate::proto;

struct StreamState {
    sse: Sse,
    // Number of frames dropped because they could not be decoded.
    skipped_frames: usize,
}

type NextEvent = Result<(Option<AgentEvent>, StreamState), Error>;

pin_project! {
    pub struct HttpAgentResponse {
        next_event_fut: Option<BoxFuture<'static, NextEvent>>,
    }
}

impl HttpAgentResponse {
    #[inline]
    pub(crate) fn from_sse(sse: Sse) -> Self {
        let state = StreamState {
            sse,
            skipped_frames: 0,
        };
        let next_event_fut = async move { next_event(state).await };
        Self {
            next_event_fut: Some(Box::pin(next_event_fut)),
        }
    }
}

impl AgentResponse for HttpAgentResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<AgentEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        let (event, state) = match ready!(next_event_fut.as_mut().poll(cx)) {
            Ok((Some(event), state)) => (event, state),
            Ok((None, state)) => {
                *this.next_event_fut = None;
                debug!(
                    "stream ended, {} frame(s) skipped",
                    state.skipped_frames
                );
                return Poll::Ready(Ok(None));
            }
            Err(err) => {
                *this.next_event_fut = None;
                return Poll::Ready(Err(err));
            }
        };

        if event.is_done() {
            // Nothing after `done` belongs to this exchange.
            *this.next_event_fut = None;
            debug!("exchange done, {} frame(s) skipped", state.skipped_frames);
        } else {
            let next_event_fut = async move { next_event(state).await };
            *this.next_event_fut = Some(Box::pin(next_event_fut));
        }

        Poll::Ready(Ok(Some(event)))
    }
}

async fn next_event(mut state: StreamState) -> NextEvent {
    loop {
        let data = match state.sse.next_event().await {
            Ok(Some(SseEvent::Data(data))) => data,
            Ok(Some(SseEvent::Malformed)) => {
                warn!("skipping a frame that is not valid UTF-8");
                state.skipped_frames += 1;
                continue;
            }
            Ok(None) => return Ok((None, state)),
            Err(SseError::ChunksError(err)) => {
                return Err(Error::new(err.message, ErrorKind::Stream));
            }
        };
        trace!("got sse data: {data}");

        match proto::decode_frame(&data) {
            Ok(Some(event)) => return Ok((Some(event), state)),
            Ok(None) => {
                trace!("ignoring a frame of unknown type");
            }
            Err(err) => {
                // One corrupt frame must not abort an otherwise healthy
                // stream.
                warn!("skipping a malformed frame: {err}");
                state.skipped_frames += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use bytes::Bytes;

    use super::*;
    use crate::io::{Chunks, ChunksError};

    async fn collect_events(
        chunks: Chunks,
    ) -> (Vec<AgentEvent>, Option<Error>) {
        let mut resp = pin!(HttpAgentResponse::from_sse(Sse::new(chunks)));
        let mut events = vec![];
        loop {
            match poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await {
                Ok(Some(event)) => events.push(event),
                Ok(None) => return (events, None),
                Err(err) => return (events, Some(err)),
            }
        }
    }

    #[tokio::test]
    async fn test_simple_events() {
        let chunks = Chunks::from_vec_deque(
            vec![
                Bytes::from_static(
                    b"data: {\"type\": \"text\", \"content\": \"Hel\"}\n\n",
                ),
                Bytes::from_static(
                    b"data: {\"type\": \"text\", \"content\": \"lo\"}\n\n\
                      data: {\"type\": \"tool_call\", \"name\": \"identify_icp\", \"args\": {}}\n\n",
                ),
                Bytes::from_static(
                    b"data: {\"type\": \"done\", \"session_id\": \"abc\"}\n\n",
                ),
            ]
            .into(),
        );
        let (events, err) = collect_events(chunks).await;
        assert!(err.is_none());
        assert_eq!(events.len(), 4);
        assert_eq!(events[0], AgentEvent::Text("Hel".to_owned()));
        assert_eq!(events[1], AgentEvent::Text("lo".to_owned()));
        assert!(matches!(&events[2], AgentEvent::ToolCall(t) if t.name == "identify_icp"));
        assert_eq!(
            events[3],
            AgentEvent::Done {
                session_id: Some("abc".to_owned())
            }
        );
    }

    #[tokio::test]
    async fn test_malformed_frame_in_between() {
        let chunks = Chunks::from_vec_deque(
            vec![Bytes::from_static(
                b"data: {\"type\": \"text\", \"content\": \"a\"}\n\n\
                  data: {not json\n\n\
                  data: {\"type\": \"mystery\"}\n\n\
                  data: {\"type\": \"text\", \"content\": \"b\"}\n\n",
            )]
            .into(),
        );
        let (events, err) = collect_events(chunks).await;
        assert!(err.is_none());
        assert_eq!(
            events,
            vec![
                AgentEvent::Text("a".to_owned()),
                AgentEvent::Text("b".to_owned())
            ]
        );
    }

    #[tokio::test]
    async fn test_nothing_after_done() {
        let chunks = Chunks::from_vec_deque(
            vec![Bytes::from_static(
                b"data: {\"type\": \"done\"}\n\n\
                  data: {\"type\": \"text\", \"content\": \"late\"}\n\n",
            )]
            .into(),
        );
        let (events, err) = collect_events(chunks).await;
        assert!(err.is_none());
        assert_eq!(events, vec![AgentEvent::Done { session_id: None }]);
    }

    #[tokio::test]
    async fn test_read_error() {
        let chunks = Chunks::from_results(vec![
            Ok(Bytes::from_static(
                b"data: {\"type\": \"text\", \"content\": \"partial\"}\n\n",
            )),
            Err(ChunksError {
                message: "connection reset".to_owned(),
            }),
        ]);
        let (events, err) = collect_events(chunks).await;
        assert_eq!(events, vec![AgentEvent::Text("partial".to_owned())]);
        let err = err.unwrap();
        assert_eq!(err.kind, ErrorKind::Stream);
        assert_eq!(err.message(), "connection reset");
    }
}
