//! Edge gateway for the ReferGrow API: per-client rate limiting and
//! transparent reverse proxying of `/api/*` to the upstream service.

pub mod client;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
