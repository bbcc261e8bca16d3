//! Declarative retry policy for transient server and network errors.
//!
//! The policy only describes *what* is retried and *how long* to wait. The
//! retry loop itself is `reqwest-retry`'s [`RetryTransientMiddleware`],
//! which [`crate::http::Session`] installs for mounted URL prefixes.

use std::time::Duration;

use reqwest::{Method, Response, StatusCode};
use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::{Jitter, RetryTransientMiddleware, Retryable, RetryableStrategy};

/// Maximum number of attempts (including the first) for a mounted policy.
pub const MAX_ATTEMPTS: usize = 3;

/// Multiplier for the exponential backoff, in seconds.
pub const BACKOFF_FACTOR: f64 = 0.1;

/// Upper bound on any backoff.
pub const BACKOFF_MAX: Duration = Duration::from_secs(120);

/// Statuses treated as transient by default (520 is Cloudflare's "unknown error").
pub const RETRY_STATUSES: [u16; 4] = [502, 503, 504, 520];

/// Errors raised by the transport itself.
#[derive(Debug)]
pub enum TransportError {
    /// Every attempt came back with a retryable status.
    RetryExhausted {
        url: String,
        status: StatusCode,
        attempts: usize,
    },
    /// A merged hook was registered for an event the transport never fires.
    UnsupportedHookEvent(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::RetryExhausted {
                url,
                status,
                attempts,
            } => {
                write!(
                    f,
                    "Max retries exceeded for {}: {} after {} attempts",
                    url, status, attempts
                )
            }
            TransportError::UnsupportedHookEvent(event) => {
                write!(
                    f,
                    "Unsupported hook event '{}'. Expected 'request' or 'response'.",
                    event
                )
            }
        }
    }
}

impl std::error::Error for TransportError {}

/// When and how often a request is retried.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. `1` disables retries.
    pub max_attempts: usize,
    /// Retry `k` waits `backoff_factor * 2^k` seconds, capped at `backoff_max`.
    pub backoff_factor: f64,
    pub backoff_max: Duration,
    pub retry_statuses: Vec<StatusCode>,
    /// Methods eligible for status and read-error retries. Connection errors retry for any method.
    pub allowed_methods: Vec<Method>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            backoff_factor: BACKOFF_FACTOR,
            backoff_max: BACKOFF_MAX,
            retry_statuses: RETRY_STATUSES
                .iter()
                .filter_map(|code| StatusCode::from_u16(*code).ok())
                .collect(),
            allowed_methods: vec![
                Method::GET,
                Method::HEAD,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
                Method::TRACE,
            ],
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries and treats every status as final.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            retry_statuses: Vec::new(),
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_backoff_factor(mut self, backoff_factor: f64) -> Self {
        self.backoff_factor = backoff_factor;
        self
    }

    pub fn is_method_allowed(&self, method: &Method) -> bool {
        self.allowed_methods.contains(method)
    }

    /// Whether a response with `status` to a `method` request should be retried.
    pub fn is_retryable_status(&self, method: &Method, status: StatusCode) -> bool {
        self.is_method_allowed(method) && self.retry_statuses.contains(&status)
    }

    /// Wait before the first retry, clamped to `[0, backoff_max]`.
    pub fn min_retry_interval(&self) -> Duration {
        let seconds = self.backoff_factor * 2.0;
        if seconds.is_nan() || seconds <= 0.0 {
            return Duration::ZERO;
        }
        // Clamp in f64 first: from_secs_f64 panics past Duration::MAX.
        Duration::from_secs_f64(seconds.min(self.backoff_max.as_secs_f64()))
    }

    /// Exponential schedule (base 2) for `reqwest-retry`, without jitter.
    pub fn backoff(&self) -> ExponentialBackoff {
        let retries = self.max_attempts.saturating_sub(1);
        ExponentialBackoff::builder()
            .retry_bounds(self.min_retry_interval(), self.backoff_max)
            .jitter(Jitter::None)
            .build_with_max_retries(u32::try_from(retries).unwrap_or(u32::MAX))
    }

    /// Classifier for a request with the given method.
    pub fn strategy(&self, method: &Method) -> StatusStrategy {
        StatusStrategy {
            statuses: self.retry_statuses.clone(),
            idempotent: self.is_method_allowed(method),
        }
    }

    /// Retry middleware for a request with the given method, or `None` when
    /// the policy allows a single attempt.
    pub fn middleware(
        &self,
        method: &Method,
    ) -> Option<RetryTransientMiddleware<ExponentialBackoff, StatusStrategy>> {
        if self.max_attempts <= 1 {
            return None;
        }
        Some(RetryTransientMiddleware::new_with_policy_and_strategy(
            self.backoff(),
            self.strategy(method),
        ))
    }
}

/// Decides which outcomes `reqwest-retry` treats as transient.
///
/// Retryable statuses and read failures are transient only for idempotent
/// methods; connection failures are transient for every method.
#[derive(Debug, Clone)]
pub struct StatusStrategy {
    statuses: Vec<StatusCode>,
    idempotent: bool,
}

impl RetryableStrategy for StatusStrategy {
    fn handle(&self, res: &Result<Response, reqwest_middleware::Error>) -> Option<Retryable> {
        match res {
            Ok(response) if self.idempotent && self.statuses.contains(&response.status()) => {
                Some(Retryable::Transient)
            }
            Ok(_) => None,
            Err(reqwest_middleware::Error::Reqwest(e)) if e.is_connect() => {
                Some(Retryable::Transient)
            }
            Err(error) if self.idempotent => reqwest_retry::default_on_request_failure(error),
            Err(_) => Some(Retryable::Fatal),
        }
    }
}
