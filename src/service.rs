//! Request façade bound to a base URL.

use std::sync::Arc;

use anyhow::Result;
use log::debug;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Response};
use serde_json::Value;

use crate::auth::{Auth, BearerAuth, mask_secret};
use crate::config::ServiceConfig;
use crate::hooks::{HookRegistry, merge_hooks};
use crate::http::{FormData, PreparedRequest, RequestOptions, Session, Transport};

/// Sends requests relative to a fixed base URL with shared headers, auth and hooks.
///
/// The base URL and path are joined by plain concatenation: a service for
/// `https://example.com` asked for `/path` targets `https://example.com/path`,
/// and no slashes are added or removed.
pub struct RequestService<T: Transport = Session> {
    base_url: String,
    hooks: HookRegistry,
    headers: HeaderMap,
    auth: Option<Arc<dyn Auth>>,
    transport: T,
}

impl RequestService<Session> {
    /// Creates a service with a fresh [`Session`] (default retry policy on `https://`).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self::with_transport(base_url, Session::new()?))
    }

    #[tracing::instrument(skip(config), fields(base_url = %config.base_url))]
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let mut session = Session::with_user_agent(&config.user_agent)?;
        session.mount("https://", config.retry.clone());

        let mut service = Self::with_transport(config.base_url.clone(), session);
        if let Some(token) = &config.token {
            debug!("Using bearer token for authentication: {}", mask_secret(token));
            service.add_auth(BearerAuth::new(token.clone()));
        }
        service.add_headers(config.headers.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
        Ok(service)
    }
}

impl<T: Transport> RequestService<T> {
    pub fn with_transport(base_url: impl Into<String>, transport: T) -> Self {
        Self {
            base_url: base_url.into(),
            hooks: HookRegistry::default(),
            headers: HeaderMap::new(),
            auth: None,
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the transport, e.g. to mount another retry policy.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Default headers sent with every request.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn global_hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    /// Replaces the global hook registry.
    pub fn register_global_hooks(&mut self, hooks: HookRegistry) {
        self.hooks = hooks;
    }

    /// Replaces the authentication handler.
    pub fn add_auth(&mut self, auth: impl Auth + 'static) {
        self.auth = Some(Arc::new(auth));
    }

    /// Merges `headers` into the defaults; the last value written for a name wins.
    pub fn add_headers<I, K, V>(&mut self, headers: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_ref().as_bytes())?;
            let value = HeaderValue::from_str(value.as_ref())?;
            self.headers.insert(name, value);
        }
        Ok(())
    }

    pub async fn get(
        &self,
        path: &str,
        form: Option<FormData>,
        json: Option<Value>,
        options: RequestOptions,
    ) -> Result<Response> {
        self.request(Method::GET, path, form, json, options).await
    }

    pub async fn post(
        &self,
        path: &str,
        form: Option<FormData>,
        json: Option<Value>,
        options: RequestOptions,
    ) -> Result<Response> {
        self.request(Method::POST, path, form, json, options).await
    }

    pub async fn delete(
        &self,
        path: &str,
        form: Option<FormData>,
        json: Option<Value>,
        options: RequestOptions,
    ) -> Result<Response> {
        self.request(Method::DELETE, path, form, json, options).await
    }

    /// Dispatches `method` to `base_url + path` and returns the raw response.
    /// Transport errors are returned as-is.
    #[tracing::instrument(skip(self, form, json, options))]
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        form: Option<FormData>,
        json: Option<Value>,
        options: RequestOptions,
    ) -> Result<Response> {
        let request = self.prepare(method, path, form, json, options);
        debug!("Dispatching {} {}...", request.method, request.url);
        self.transport.execute(request).await
    }

    fn prepare(
        &self,
        method: Method,
        path: &str,
        form: Option<FormData>,
        json: Option<Value>,
        options: RequestOptions,
    ) -> PreparedRequest {
        let RequestOptions {
            allow_redirects,
            proxies,
            hooks,
            timeout,
            query,
            headers: call_headers,
        } = options;

        let mut headers = self.headers.clone();
        for (name, value) in call_headers.iter() {
            headers.insert(name.clone(), value.clone());
        }

        PreparedRequest {
            method,
            url: format!("{}{}", self.base_url, path),
            headers,
            auth: self.auth.clone(),
            form,
            json,
            hooks: merge_hooks([&self.hooks, &hooks]),
            allow_redirects,
            proxies,
            timeout,
            query,
        }
    }
}
