//! Service configuration, optionally read from the environment.

use crate::http::DEFAULT_USER_AGENT;
use crate::retry::RetryPolicy;

/// Environment variable holding a bearer token.
pub const TOKEN_ENV: &str = "REQUEST_SERVICE_TOKEN";

/// Environment variable overriding the user agent.
pub const USER_AGENT_ENV: &str = "REQUEST_SERVICE_USER_AGENT";

/// Everything needed to build a [`crate::RequestService`].
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Sent as `Authorization: Bearer <token>` when set.
    pub token: Option<String>,
    /// Default headers added to every request.
    pub headers: Vec<(String, String)>,
    /// Policy mounted on `https://`.
    pub retry: RetryPolicy,
}

impl ServiceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            token: None,
            headers: Vec::new(),
            retry: RetryPolicy::default(),
        }
    }

    /// Reads the token and user agent from the process environment.
    pub fn from_env(base_url: impl Into<String>) -> Self {
        Self::from_lookup(base_url, |key| std::env::var(key).ok())
    }

    /// Same as [`ServiceConfig::from_env`] with an injected variable lookup.
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(base_url: impl Into<String>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut config = Self::new(base_url);
        if let Some(user_agent) = get(USER_AGENT_ENV) {
            config.user_agent = user_agent;
        }
        config.token = get(TOKEN_ENV);
        config
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
