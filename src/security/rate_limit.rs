//! Fixed-window admission control per route class and client identity.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::RateLimitConfig;
use crate::http::response::too_many_requests;
use crate::observability::metrics;
use crate::security::identity::{client_identity, rate_key, RouteClass};
use crate::security::store::{MemoryRateStore, RateStore};

/// Window length and per-class ceilings.
#[derive(Debug, Clone)]
pub struct RatePolicy {
    pub window: Duration,
    pub auth_prefix: String,
    pub auth_max: u32,
    pub api_max: u32,
}

impl RatePolicy {
    pub fn ceiling(&self, class: RouteClass) -> u32 {
        match class {
            RouteClass::Auth => self.auth_max,
            RouteClass::Api => self.api_max,
        }
    }
}

impl From<&RateLimitConfig> for RatePolicy {
    fn from(config: &RateLimitConfig) -> Self {
        Self {
            window: Duration::from_millis(config.window_ms),
            auth_prefix: config.auth_prefix.clone(),
            auth_max: config.auth_max,
            api_max: config.api_max,
        }
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Admit,
    Reject {
        class: RouteClass,
        key: String,
        retry_after_secs: u64,
    },
}

/// Seconds until `reset_at`, rounded up, never below one.
pub fn retry_after_secs(reset_at: Instant, now: Instant) -> u64 {
    let remaining_ms = reset_at.saturating_duration_since(now).as_millis() as u64;
    remaining_ms.div_ceil(1000).max(1)
}

/// Admission controller. The store is injected so tests and alternative
/// backends get their own isolated state.
pub struct RateLimiter {
    store: Arc<dyn RateStore>,
    policy: RatePolicy,
    enabled: bool,
}

impl RateLimiter {
    /// Limiter backed by a fresh in-process store.
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_store(config, Arc::new(MemoryRateStore::new()))
    }

    pub fn with_store(config: &RateLimitConfig, store: Arc<dyn RateStore>) -> Self {
        Self {
            store,
            policy: RatePolicy::from(config),
            enabled: config.enabled,
        }
    }

    pub fn classify(&self, path: &str) -> RouteClass {
        RouteClass::classify(path, &self.policy.auth_prefix)
    }

    pub fn check(&self, path: &str, headers: &HeaderMap) -> Decision {
        self.check_at(path, headers, Instant::now())
    }

    /// Admission check against an explicit clock reading.
    pub fn check_at(&self, path: &str, headers: &HeaderMap, now: Instant) -> Decision {
        if !self.enabled {
            return Decision::Admit;
        }

        let class = self.classify(path);
        let key = rate_key(class, &client_identity(headers));
        let entry = self.store.hit(&key, now, self.policy.window);

        // The request that opens a window is always admitted.
        if entry.count > self.policy.ceiling(class).max(1) {
            Decision::Reject {
                class,
                key,
                retry_after_secs: retry_after_secs(entry.reset_at, now),
            }
        } else {
            Decision::Admit
        }
    }

    /// Evict windows that have already elapsed.
    pub fn sweep(&self, now: Instant) -> usize {
        self.store.sweep_expired(now)
    }

    pub fn tracked_keys(&self) -> usize {
        self.store.len()
    }
}

/// Middleware rejecting over-limit requests before they reach the proxy.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match limiter.check(request.uri().path(), request.headers()) {
        Decision::Admit => next.run(request).await,
        Decision::Reject {
            class,
            key,
            retry_after_secs,
        } => {
            tracing::warn!(
                client = %key,
                class = %class,
                retry_after_secs,
                "Rate limit exceeded"
            );
            metrics::record_rate_limited(class.as_str());
            too_many_requests(retry_after_secs)
        }
    }
}

/// Periodically evict expired windows so the store stays bounded by the
/// number of clients active within one window.
pub fn spawn_sweeper(
    limiter: Arc<RateLimiter>,
    every: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = limiter.sweep(Instant::now());
                    let tracked = limiter.tracked_keys();
                    metrics::record_tracked_keys(tracked);
                    if removed > 0 {
                        tracing::debug!(removed, tracked, "Swept expired rate limit windows");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Rate limit sweeper stopping");
                    break;
                }
            }
        }
    })
}
