//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Preferred, server-only variable naming the upstream origin.
pub const UPSTREAM_BASE_URL_ENV: &str = "UPSTREAM_BASE_URL";

/// Public-equivalent fallback for the upstream origin.
pub const PUBLIC_API_BASE_URL_ENV: &str = "PUBLIC_API_BASE_URL";

/// Overrides the listener bind address.
pub const BIND_ADDRESS_ENV: &str = "GATEWAY_BIND_ADDRESS";

/// Root configuration for the edge gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream API service the gateway forwards to.
    pub upstream: UpstreamConfig,

    /// Admission control (per-client, per-route-class rate limiting).
    pub rate_limit: RateLimitConfig,

    /// Timeout configuration at the inbound edge.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl GatewayConfig {
    /// Apply environment overrides on top of file/default values.
    ///
    /// `lookup` is usually `|k| std::env::var(k).ok()`; tests inject a map.
    /// Blank values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(base) = non_blank(UPSTREAM_BASE_URL_ENV).or_else(|| non_blank(PUBLIC_API_BASE_URL_ENV)) {
            self.upstream.base_url = base.trim().to_string();
        }

        if let Some(bind) = non_blank(BIND_ADDRESS_ENV) {
            self.listener.bind_address = bind.trim().to_string();
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Upstream service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Origin of the upstream API (scheme + host + optional port).
    pub base_url: String,

    /// Total deadline for one upstream exchange, in seconds.
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl UpstreamConfig {
    /// Base URL with a trailing slash stripped, ready to have a path appended.
    pub fn normalized_base(&self) -> &str {
        self.base_url.strip_suffix('/').unwrap_or(&self.base_url)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000".to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 5,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Fixed window length in milliseconds (shared by both route classes).
    pub window_ms: u64,

    /// Path prefix selecting the `auth` route class.
    pub auth_prefix: String,

    /// Ceiling for the `auth` class per window.
    pub auth_max: u32,

    /// Ceiling for every other API path per window.
    pub api_max: u32,

    /// How often expired windows are evicted from the store, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_ms: 60_000,
            auth_prefix: "/api/auth/".to_string(),
            auth_max: 20,
            api_max: 120,
            sweep_interval_secs: 60,
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_defaults_match_wire_contract() {
        let config = GatewayConfig::default();
        assert_eq!(config.upstream.base_url, "http://localhost:4000");
        assert_eq!(config.rate_limit.window_ms, 60_000);
        assert_eq!(config.rate_limit.auth_max, 20);
        assert_eq!(config.rate_limit.api_max, 120);
        assert_eq!(config.rate_limit.auth_prefix, "/api/auth/");
    }

    #[test]
    fn test_server_only_variable_wins() {
        let mut config = GatewayConfig::default();
        config.apply_env(env(&[
            (UPSTREAM_BASE_URL_ENV, "http://api.internal:8000"),
            (PUBLIC_API_BASE_URL_ENV, "https://api.example.com"),
        ]));
        assert_eq!(config.upstream.base_url, "http://api.internal:8000");
    }

    #[test]
    fn test_public_variable_is_fallback() {
        let mut config = GatewayConfig::default();
        config.apply_env(env(&[
            (UPSTREAM_BASE_URL_ENV, "   "),
            (PUBLIC_API_BASE_URL_ENV, "https://api.example.com/"),
        ]));
        assert_eq!(config.upstream.base_url, "https://api.example.com/");
        assert_eq!(config.upstream.normalized_base(), "https://api.example.com");
    }

    #[test]
    fn test_no_env_keeps_default() {
        let mut config = GatewayConfig::default();
        config.apply_env(env(&[]));
        assert_eq!(config.upstream.base_url, "http://localhost:4000");
        assert_eq!(config.listener.bind_address, "0.0.0.0:3000");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [upstream]
            base_url = "http://backend:4000/"

            [rate_limit]
            auth_max = 5

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.upstream.normalized_base(), "http://backend:4000");
        assert_eq!(config.upstream.timeout_secs, 30);
        assert_eq!(config.rate_limit.auth_max, 5);
        assert_eq!(config.rate_limit.api_max, 120);
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }
}
