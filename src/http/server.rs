//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, timeout, admission control)
//! - Serve on a listener until shutdown
//! - Forward admitted `/api/*` requests to the upstream service
//! - Observability (metrics, correlation IDs)

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, MethodRouter},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::http::proxy::{ProxyError, Upstream};
use crate::http::request::{is_bodyless, ProxyRequest};
use crate::http::response::error_json;
use crate::observability::metrics;
use crate::security::rate_limit::{rate_limit_middleware, spawn_sweeper, RateLimiter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub limiter: Arc<RateLimiter>,
    pub upstream: Upstream,
}

/// HTTP server for the edge gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    limiter: Arc<RateLimiter>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, ProxyError> {
        let limiter = Arc::new(RateLimiter::new(&config.rate_limit));
        let upstream = Upstream::new(&config.upstream)?;

        let state = AppState {
            limiter: limiter.clone(),
            upstream,
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            limiter,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let api = Router::new()
            .route("/api", forwarded_methods())
            .route("/api/", forwarded_methods())
            .route("/api/{*path}", forwarded_methods())
            .route_layer(middleware::from_fn_with_state(
                state.limiter.clone(),
                rate_limit_middleware,
            ));

        Router::new()
            .route("/healthz", get(healthz))
            .merge(api)
            .fallback(not_found)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// Run the server until a shutdown signal arrives on `shutdown`.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.normalized_base(),
            "HTTP server starting"
        );

        let sweeper = self.config.rate_limit.enabled.then(|| {
            spawn_sweeper(
                self.limiter.clone(),
                Duration::from_secs(self.config.rate_limit.sweep_interval_secs),
                shutdown.resubscribe(),
            )
        });

        let served = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining in-flight requests");
            })
            .await;

        if let Some(sweeper) = sweeper {
            sweeper.abort();
        }
        served?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// A clone of the fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn limiter(&self) -> Arc<RateLimiter> {
        self.limiter.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// GET (and HEAD), POST, PUT, PATCH, DELETE; anything else is a 405.
fn forwarded_methods() -> MethodRouter<AppState> {
    get(proxy_handler)
        .post(proxy_handler)
        .put(proxy_handler)
        .patch(proxy_handler)
        .delete(proxy_handler)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn not_found() -> Response {
    error_json(StatusCode::NOT_FOUND, "Not Found")
}

/// Forward an admitted request upstream and relay the answer.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let (parts, body) = request.into_parts();

    let request_id = parts
        .headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let class = state.limiter.classify(parts.uri.path());
    let method = parts.method.as_str().to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %parts.uri.path(),
        class = %class,
        "Proxying request"
    );

    let body = if is_bodyless(&parts.method) {
        None
    } else {
        match axum::body::to_bytes(body, usize::MAX).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                let err = ProxyError::RequestBody(e);
                tracing::warn!(request_id = %request_id, error = %err, "Rejecting request");
                metrics::record_request(&method, err.status().as_u16(), class.as_str(), start_time);
                return err.into_response();
            }
        }
    };

    let outbound = ProxyRequest::new(
        state.upstream.base(),
        &parts.method,
        &parts.uri,
        &parts.headers,
        body,
    );

    match state.upstream.forward(outbound).await {
        Ok(response) => {
            metrics::record_request(&method, response.status.as_u16(), class.as_str(), start_time);
            response.into_response()
        }
        Err(err) => {
            tracing::error!(request_id = %request_id, error = %err, "Upstream error");
            metrics::record_upstream_error(err.kind());
            metrics::record_request(&method, err.status().as_u16(), class.as_str(), start_time);
            err.into_response()
        }
    }
}
