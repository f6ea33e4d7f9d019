use std::env;
use std::time::Duration;

/// The environment variable consulted by [`AgentConfigBuilder::from_env`].
pub const BASE_URL_ENV: &str = "AGENT_API_URL";

const DEFAULT_BASE_URL: &str = "http://localhost:8123";

/// Builder for [`AgentConfig`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AgentConfigBuilder {
    base_url: Option<String>,
    connect_timeout: Option<Duration>,
}

impl AgentConfigBuilder {
    /// Creates a builder with every option unset.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder seeded from the environment.
    ///
    /// The base URL is read from `AGENT_API_URL` if it is set and not
    /// empty.
    pub fn from_env() -> Self {
        Self::from_base_url_var(env::var(BASE_URL_ENV).ok())
    }

    fn from_base_url_var(value: Option<String>) -> Self {
        Self {
            base_url: value.filter(|v| !v.is_empty()),
            connect_timeout: None,
        }
    }

    /// Sets the base URL of the agent service.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets a timeout for establishing connections.
    ///
    /// Streamed bodies are not affected, an exchange may last as long as
    /// the agent keeps it open.
    #[inline]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> AgentConfig {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        AgentConfig {
            base_url: base_url.trim_end_matches('/').to_owned(),
            connect_timeout: self.connect_timeout,
        }
    }
}

/// Configuration for the HTTP agent transport.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AgentConfig {
    pub(crate) base_url: String,
    pub(crate) connect_timeout: Option<Duration>,
}

impl AgentConfig {
    /// Returns the base URL, without a trailing slash.
    #[inline]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[inline]
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
