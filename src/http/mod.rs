//! HTTP transport: request options, the `Transport` seam and its `reqwest` session.

mod request;
mod session;

pub use request::{FormData, PreparedRequest, Proxies, RequestOptions};
#[cfg(test)]
pub use session::MockTransport;
pub use session::{DEFAULT_MAX_REDIRECTS, DEFAULT_USER_AGENT, Session, Transport};
