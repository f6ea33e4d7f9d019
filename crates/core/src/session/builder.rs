use std::time::Duration;

use agent_chat_model::AgentTransport;

use super::ChatSession;
use crate::error::ExchangeError;
use crate::transcript::Transcript;

pub(crate) type UpdateFn = Box<dyn Fn(&Transcript) + Send + Sync>;
pub(crate) type ErrorFn = Box<dyn Fn(&ExchangeError) + Send + Sync>;
pub(crate) type IdleFn = Box<dyn Fn() + Send + Sync>;

/// [`ChatSession`] builder.
pub struct ChatSessionBuilder<T> {
    pub(crate) transport: T,
    pub(crate) on_update: Option<UpdateFn>,
    pub(crate) on_error: Option<ErrorFn>,
    pub(crate) on_idle: Option<IdleFn>,
    pub(crate) idle_timeout: Option<Duration>,
}

impl<T: AgentTransport + 'static> ChatSessionBuilder<T> {
    /// Creates a new builder with the specified transport.
    #[inline]
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            on_update: None,
            on_error: None,
            on_idle: None,
            idle_timeout: None,
        }
    }

    /// Attaches a callback to be invoked whenever the transcript changes.
    #[inline]
    pub fn on_update(
        mut self,
        on_update: impl Fn(&Transcript) + Send + Sync + 'static,
    ) -> Self {
        self.on_update = Some(Box::new(on_update));
        self
    }

    /// Attaches a callback to be invoked once for every failed exchange.
    #[inline]
    pub fn on_error(
        mut self,
        on_error: impl Fn(&ExchangeError) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Some(Box::new(on_error));
        self
    }

    /// Attaches a callback to be invoked when an exchange has finished,
    /// whether it succeeded or not.
    #[inline]
    pub fn on_idle(
        mut self,
        on_idle: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.on_idle = Some(Box::new(on_idle));
        self
    }

    /// Fails an exchange when the agent stays silent for `timeout`.
    ///
    /// Without it, an agent that never finishes keeps the session busy
    /// until the connection drops.
    #[inline]
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Builds the session.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    #[inline]
    pub fn build(self) -> ChatSession {
        ChatSession::spawn_from_builder(self)
    }
}
