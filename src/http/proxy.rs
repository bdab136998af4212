//! Upstream forwarding.
//!
//! # Responsibilities
//! - Own the outbound HTTP client
//! - Send the rewritten request and buffer the upstream response
//! - Classify upstream failures into gateway error responses
//!
//! # Design Decisions
//! - Redirects are relayed, never followed
//! - No cookie store and no caching on the outbound client
//! - Every call has a deadline; expiry is a 504
//! - No automatic retries: failures surface immediately as 502/504

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use hyper::ext::ReasonPhrase;
use reqwest::redirect;
use thiserror::Error;

use crate::config::UpstreamConfig;
use crate::http::request::ProxyRequest;
use crate::http::response::{error_json, ProxyResponse};

/// Errors produced while forwarding a request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The upstream did not answer within the configured deadline.
    #[error("upstream timed out")]
    Timeout,

    /// Connection refused, reset, DNS failure, malformed response...
    #[error("upstream request failed: {0}")]
    Upstream(#[source] reqwest::Error),

    /// The inbound body could not be read to completion.
    #[error("failed to read request body: {0}")]
    RequestBody(#[source] axum::Error),

    /// The outbound client could not be constructed.
    #[error("failed to build upstream client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ProxyError {
    fn from_send(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProxyError::Timeout
        } else {
            ProxyError::Upstream(err)
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::RequestBody(_) => StatusCode::BAD_REQUEST,
            ProxyError::Client(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::Timeout => "timeout",
            ProxyError::Upstream(_) => "upstream",
            ProxyError::RequestBody(_) => "request_body",
            ProxyError::Client(_) => "client",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let message = match &self {
            ProxyError::Timeout => "Upstream timed out",
            ProxyError::Upstream(_) => "Upstream request failed",
            ProxyError::RequestBody(_) => "Invalid request body",
            ProxyError::Client(_) => "Internal gateway error",
        };
        error_json(self.status(), message)
    }
}

/// Handle to the upstream API service.
#[derive(Debug, Clone)]
pub struct Upstream {
    client: reqwest::Client,
    base: String,
}

impl Upstream {
    pub fn new(config: &UpstreamConfig) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .no_proxy()
            .build()
            .map_err(ProxyError::Client)?;

        Ok(Self {
            client,
            base: config.normalized_base().to_string(),
        })
    }

    /// Normalized upstream origin (no trailing slash).
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Send `request` upstream and buffer the full response.
    pub async fn forward(&self, request: ProxyRequest) -> Result<ProxyResponse, ProxyError> {
        let mut outbound = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            outbound = outbound.body(body);
        }

        let response = outbound.send().await.map_err(ProxyError::from_send)?;
        let status = response.status();
        let reason = response.extensions().get::<ReasonPhrase>().cloned();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(ProxyError::from_send)?;

        Ok(ProxyResponse {
            status,
            reason,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_is_normalized() {
        let config = UpstreamConfig {
            base_url: "http://backend:4000/".into(),
            ..UpstreamConfig::default()
        };
        let upstream = Upstream::new(&config).unwrap();
        assert_eq!(upstream.base(), "http://backend:4000");
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(ProxyError::Timeout.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(ProxyError::Timeout.kind(), "timeout");
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_bad_gateway() {
        // Bind then drop to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = UpstreamConfig {
            base_url: format!("http://{}", addr),
            timeout_secs: 2,
            connect_timeout_secs: 1,
        };
        let upstream = Upstream::new(&config).unwrap();
        let request = ProxyRequest {
            method: axum::http::Method::GET,
            url: format!("{}/api/services", upstream.base()),
            headers: Default::default(),
            body: None,
        };

        let err = upstream.forward(request).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        let response = err.into_response();
        assert_eq!(response.headers()["content-type"], "application/json");
    }
}
