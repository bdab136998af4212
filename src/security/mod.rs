//! Admission control subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming /api/* request:
//!     → identity.rs (route class from path, client id from headers)
//!     → rate_limit.rs (fixed-window check against the store)
//!     → store.rs (atomic per-key hit)
//!     → Admit: pass to proxy | Reject: 429 + Retry-After
//! ```
//!
//! # Design Decisions
//! - Never fails: a decision is always produced
//! - Store injected into the limiter, not a process global
//! - Per-instance counters; multiple gateways do not aggregate

pub mod identity;
pub mod rate_limit;
pub mod store;

pub use identity::{client_identity, RouteClass};
pub use rate_limit::{rate_limit_middleware, spawn_sweeper, Decision, RateLimiter};
pub use store::{MemoryRateStore, RateEntry, RateStore};
