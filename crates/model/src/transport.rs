use std::error::Error;

use crate::error::ErrorKind;
use crate::request::ChatRequest;
use crate::response::AgentResponse;

/// The error type for an agent transport.
pub trait TransportError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A type that carries exchanges to a remote agent.
///
/// Once the transport is created, it should behave like a stateless
/// object. The session identity travels inside each [`ChatRequest`], so
/// the transport never needs to remember anything between exchanges.
pub trait AgentTransport: Send + Sync {
    /// The error type that may be returned by the transport.
    type Error: TransportError;

    /// The response type for this transport.
    type Response: AgentResponse<Error = Self::Error>;

    /// Opens one streaming exchange with the agent.
    ///
    /// The returned future resolves once the agent has accepted the
    /// request (for HTTP, once a success status has been received).
    fn send_request(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static;
}
