//! Per-call options and the request shape handed to a [`super::Transport`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::header::HeaderMap;
use reqwest::{ClientBuilder, Method, Proxy};
use serde_json::Value;

use crate::auth::Auth;
use crate::hooks::{HookRegistry, HookValue, MergedHooks};

/// URL-encoded form fields, sent in order.
pub type FormData = Vec<(String, String)>;

/// Proxy overrides for a single call. Empty means "use the client defaults".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Proxies {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

impl Proxies {
    pub fn is_empty(&self) -> bool {
        self.http.is_none() && self.https.is_none() && self.all.is_none()
    }

    pub(crate) fn apply(&self, mut builder: ClientBuilder) -> Result<ClientBuilder> {
        if let Some(url) = &self.http {
            builder = builder.proxy(Proxy::http(url)?);
        }
        if let Some(url) = &self.https {
            builder = builder.proxy(Proxy::https(url)?);
        }
        if let Some(url) = &self.all {
            builder = builder.proxy(Proxy::all(url)?);
        }
        Ok(builder)
    }
}

/// Options recognized by every dispatch method.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Follow redirects (default: true).
    pub allow_redirects: bool,
    pub proxies: Proxies,
    /// Per-call hooks, merged after the global ones.
    pub hooks: HookRegistry,
    /// Total request timeout (default: none).
    pub timeout: Option<Duration>,
    pub query: Vec<(String, String)>,
    /// Extra headers for this call; they override default headers per key.
    pub headers: HeaderMap,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            allow_redirects: true,
            proxies: Proxies::default(),
            hooks: HookRegistry::default(),
            timeout: None,
            query: Vec::new(),
            headers: HeaderMap::new(),
        }
    }
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_redirects(mut self, allow: bool) -> Self {
        self.allow_redirects = allow;
        self
    }

    pub fn proxies(mut self, proxies: Proxies) -> Self {
        self.proxies = proxies;
        self
    }

    pub fn hook(mut self, event: impl Into<String>, value: impl Into<HookValue>) -> Self {
        self.hooks.insert(event, value);
        self
    }

    pub fn hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

/// A fully resolved call: absolute URL, effective headers, merged hooks.
#[derive(Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub auth: Option<Arc<dyn Auth>>,
    pub form: Option<FormData>,
    pub json: Option<Value>,
    pub hooks: MergedHooks,
    pub allow_redirects: bool,
    pub proxies: Proxies,
    pub timeout: Option<Duration>,
    pub query: Vec<(String, String)>,
}

impl std::fmt::Debug for PreparedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("auth", &self.auth.is_some())
            .field("form", &self.form)
            .field("json", &self.json)
            .field("hooks", &self.hooks)
            .field("allow_redirects", &self.allow_redirects)
            .field("proxies", &self.proxies)
            .field("timeout", &self.timeout)
            .field("query", &self.query)
            .finish()
    }
}
