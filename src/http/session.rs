//! Long-lived HTTP session over `reqwest` with mounted retry policies.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, ClientBuilder, Request, Response, redirect};
use reqwest_middleware::{Middleware, Next};
use reqwest_retry::RetryError;

use super::request::PreparedRequest;
use crate::auth::Auth;
use crate::hooks::{HookEvent, HookPayload, MergedHooks};
use crate::retry::{RetryPolicy, TransportError};

/// Redirect limit for the shared client.
pub const DEFAULT_MAX_REDIRECTS: usize = 30;

/// User agent sent unless a caller configures another one.
pub const DEFAULT_USER_AGENT: &str = concat!("request-service/", env!("CARGO_PKG_VERSION"));

/// Sends a prepared request and returns the raw response.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: PreparedRequest) -> Result<Response>;
}

#[derive(Debug, Clone)]
struct Mount {
    prefix: String,
    policy: RetryPolicy,
}

/// HTTP session: one shared `reqwest::Client` plus retry policies keyed by URL prefix.
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
    user_agent: String,
    mounts: Vec<Mount>,
}

impl Session {
    /// Creates a session with the default retry policy mounted on `https://`.
    pub fn new() -> Result<Self> {
        Self::with_user_agent(DEFAULT_USER_AGENT)
    }

    #[tracing::instrument]
    pub fn with_user_agent(user_agent: &str) -> Result<Self> {
        let user_agent = user_agent.to_string();
        let client = client_builder(&user_agent).build()?;
        let mut session = Self {
            client,
            user_agent,
            mounts: Vec::new(),
        };
        session.mount("https://", RetryPolicy::default());
        Ok(session)
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Registers `policy` for every URL starting with `prefix`, replacing an
    /// existing mount with the same prefix. The longest matching prefix wins.
    pub fn mount(&mut self, prefix: impl Into<String>, policy: RetryPolicy) {
        let prefix = prefix.into().to_ascii_lowercase();
        self.mounts.retain(|m| m.prefix != prefix);
        self.mounts.push(Mount { prefix, policy });
        self.mounts.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
    }

    /// The policy that applies to `url`, if any prefix matches.
    pub fn retry_policy_for(&self, url: &str) -> Option<&RetryPolicy> {
        let url = url.to_ascii_lowercase();
        self.mounts
            .iter()
            .find(|m| url.starts_with(&m.prefix))
            .map(|m| &m.policy)
    }

    /// The shared client, or a one-off variant when the call changes
    /// redirect or proxy behavior.
    fn client_for(&self, request: &PreparedRequest) -> Result<Client> {
        if request.allow_redirects && request.proxies.is_empty() {
            return Ok(self.client.clone());
        }

        let mut builder = client_builder(&self.user_agent);
        if !request.allow_redirects {
            builder = builder.redirect(redirect::Policy::none());
        }
        builder = request.proxies.apply(builder)?;
        Ok(builder.build()?)
    }
}

fn client_builder(user_agent: &str) -> ClientBuilder {
    Client::builder()
        .user_agent(user_agent)
        .redirect(redirect::Policy::limited(DEFAULT_MAX_REDIRECTS))
}

/// Builds the outgoing request without auth; auth is applied per attempt.
fn build_request(client: &Client, request: &PreparedRequest) -> Result<Request> {
    let mut builder = client
        .request(request.method.clone(), &request.url)
        .headers(request.headers.clone());

    if !request.query.is_empty() {
        builder = builder.query(&request.query);
    }
    if let Some(timeout) = request.timeout {
        builder = builder.timeout(timeout);
    }
    match (&request.form, &request.json) {
        (Some(form), _) if !form.is_empty() => builder = builder.form(form),
        (_, Some(json)) => builder = builder.json(json),
        _ => {}
    }

    Ok(builder.build()?)
}

/// Innermost middleware: runs once per attempt, below the retry middleware.
struct Attempt {
    auth: Option<Arc<dyn Auth>>,
    hooks: MergedHooks,
    count: Arc<AtomicUsize>,
}

#[async_trait]
impl Middleware for Attempt {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut ::http::Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let attempt = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt > 1 {
            warn!("{} {}: retrying, attempt {}", req.method(), req.url(), attempt);
        }

        if let Some(auth) = &self.auth {
            auth.apply(&mut req).map_err(reqwest_middleware::Error::Middleware)?;
        }
        self.hooks.dispatch(HookEvent::Request, &HookPayload::Request(&req));
        next.run(req, extensions).await
    }
}

/// Strips the middleware and retry wrappers so callers see the original error.
fn unwrap_error(err: reqwest_middleware::Error) -> anyhow::Error {
    match err {
        reqwest_middleware::Error::Reqwest(e) => e.into(),
        reqwest_middleware::Error::Middleware(e) => match e.downcast::<RetryError>() {
            Ok(RetryError::WithRetries { err, .. }) | Ok(RetryError::Error(err)) => {
                unwrap_error(err)
            }
            Err(e) => e,
        },
    }
}

#[async_trait]
impl Transport for Session {
    #[tracing::instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn execute(&self, request: PreparedRequest) -> Result<Response> {
        for event in request.hooks.events() {
            if event.parse::<HookEvent>().is_err() {
                return Err(TransportError::UnsupportedHookEvent(event.to_string()).into());
            }
        }

        let client = self.client_for(&request)?;
        let outgoing = build_request(&client, &request)?;
        let policy = self.retry_policy_for(&request.url);

        let mut builder = reqwest_middleware::ClientBuilder::new(client);
        if let Some(retry) = policy.and_then(|p| p.middleware(&request.method)) {
            builder = builder.with(retry);
        }
        let count = Arc::new(AtomicUsize::new(0));
        let client = builder
            .with(Attempt {
                auth: request.auth.clone(),
                hooks: request.hooks.clone(),
                count: Arc::clone(&count),
            })
            .build();

        let response = match client.execute(outgoing).await {
            Ok(response) => response,
            Err(e) => {
                let err = unwrap_error(e);
                debug!("{} {}: giving up: {}", request.method, request.url, err);
                return Err(err);
            }
        };

        let status = response.status();
        let exhausted = policy.is_some_and(|p| p.is_retryable_status(&request.method, status));
        if exhausted {
            return Err(TransportError::RetryExhausted {
                url: request.url.clone(),
                status,
                attempts: count.load(Ordering::SeqCst),
            }
            .into());
        }

        debug!("{} {} -> {}", request.method, request.url, status);
        request
            .hooks
            .dispatch(HookEvent::Response, &HookPayload::Response(&response));
        Ok(response)
    }
}
