//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → security::rate_limit (admission; may short-circuit with 429)
//!     → request.rs (rewrite target, filter headers, body rules)
//!     → proxy.rs (send upstream, buffer response, map failures)
//!     → response.rs (strip hop-by-hop, split set-cookie)
//!     → Send to client
//! ```

pub mod proxy;
pub mod request;
pub mod response;
pub mod server;

pub use proxy::{ProxyError, Upstream};
pub use request::ProxyRequest;
pub use response::ProxyResponse;
pub use server::HttpServer;
