//! Convenience wrapper around `reqwest`: a base URL, shared headers and auth,
//! event hooks merged from global and per-call registries, and a bounded
//! retry policy for transient server errors.
//!
//! ```no_run
//! use request_service::{Hook, HookPayload, HookRegistry, RequestOptions, RequestService};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let mut service = RequestService::new("https://example.com")?;
//! service.add_headers([("X-Client", "docs")])?;
//! service.register_global_hooks(HookRegistry::new().with(
//!     "response",
//!     Hook::new(|payload| {
//!         if let HookPayload::Response(response) = payload {
//!             println!("{}", response.status());
//!         }
//!     }),
//! ));
//!
//! let response = service.get("/path", None, None, RequestOptions::default()).await?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod hooks;
pub mod http;
pub mod retry;
pub mod service;

pub use auth::{Auth, BasicAuth, BearerAuth};
pub use config::ServiceConfig;
pub use hooks::{Hook, HookEvent, HookPayload, HookRegistry, HookValue, MergedHooks, merge_hooks};
pub use http::{FormData, PreparedRequest, Proxies, RequestOptions, Session, Transport};
pub use retry::{RetryPolicy, TransportError};
pub use service::RequestService;
