//! An agent transport over HTTP with server-sent events.

#[macro_use]
extern crate tracing;

mod config;
mod io;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use agent_chat_model::{AgentTransport, ChatRequest, ErrorKind, TransportError};
use mime::Mime;
use reqwest::{Client, Response, StatusCode, Url, header};

pub use config::{AgentConfig, AgentConfigBuilder, BASE_URL_ENV};
use io::{Chunks, Sse};
pub use proto::Health;
pub use response::HttpAgentResponse;

/// Error type for [`HttpAgentTransport`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    fn from_status(status: StatusCode) -> Self {
        Self::new(
            format!("HTTP error! status: {}", status.as_u16()),
            ErrorKind::Status(status.as_u16()),
        )
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl TransportError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Agent transport talking to the agent service over HTTP.
#[derive(Clone, Debug)]
pub struct HttpAgentTransport {
    client: Client,
    config: Arc<AgentConfig>,
}

impl HttpAgentTransport {
    /// Creates a new `HttpAgentTransport` with the given configuration.
    pub fn new(config: AgentConfig) -> Result<Self, Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    /// Returns the configuration of this transport.
    #[inline]
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Probes the agent service.
    pub async fn health(&self) -> Result<Health, Error> {
        let resp = self
            .client
            .get(self.config.endpoint("/health"))
            .send()
            .await
            .map_err(|err| Error::new(format!("{err}"), ErrorKind::Connect))?;
        let resp = check_status(resp)?;
        resp.json::<Health>()
            .await
            .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))
    }

    /// Asks the agent service to forget a session.
    ///
    /// A session the service doesn't know yields a `Status(404)` error.
    pub async fn delete_session(&self, session_id: &str) -> Result<(), Error> {
        let url = self.session_url(session_id)?;
        let resp = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(|err| Error::new(format!("{err}"), ErrorKind::Connect))?;
        check_status(resp)?;
        debug!("deleted session {session_id}");
        Ok(())
    }

    /// The session id is opaque, it becomes exactly one path segment.
    fn session_url(&self, session_id: &str) -> Result<Url, Error> {
        let invalid_url = |err: String| Error::new(err, ErrorKind::Other);
        let mut url = Url::parse(&self.config.endpoint("/sessions"))
            .map_err(|err| invalid_url(format!("{err}")))?;
        url.path_segments_mut()
            .map_err(|_| invalid_url("base URL cannot have a path".to_owned()))?
            .push(session_id);
        Ok(url)
    }
}

impl AgentTransport for HttpAgentTransport {
    type Error = Error;
    type Response = HttpAgentResponse;

    fn send_request(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let body = proto::create_request(req);
        let resp_fut = self
            .client
            .post(self.config.endpoint("/chat/stream"))
            .header(header::ACCEPT, "text/event-stream")
            .json(&body)
            .send();

        async move {
            let resp = resp_fut.await.map_err(|err| {
                Error::new(format!("{err}"), ErrorKind::Connect)
            })?;
            let resp = check_status(resp)?;

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            let is_event_stream = content_type
                .and_then(|v| v.parse().ok())
                .map(|m: Mime| {
                    m.type_() == mime::TEXT && m.subtype() == mime::EVENT_STREAM
                })
                .unwrap_or(false);
            if !is_event_stream {
                // Still try to read it, the frames are what matter.
                warn!("unexpected content type: {content_type:?}");
            }

            // Here we got a successful response.
            let chunks = Chunks::from_response(resp);
            let sse = Sse::new(chunks);
            Ok(HttpAgentResponse::from_sse(sse))
        }
    }
}

#[inline]
fn check_status(resp: Response) -> Result<Response, Error> {
    let status = resp.status();
    if !status.is_success() {
        error!("agent responded with {status}");
        return Err(Error::from_status(status));
    }
    Ok(resp)
}
