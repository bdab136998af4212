//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ceilings > 0)
//! - Keep the upstream deadline inside the edge request deadline
//! - Check the upstream origin and bind address parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("upstream.base_url '{0}' is not an absolute http(s) URL")]
    UpstreamUrl(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("rate_limit.auth_prefix '{0}' must start with /api/")]
    AuthPrefix(String),

    #[error("upstream.timeout_secs ({upstream}) must be below timeouts.request_secs ({request})")]
    UpstreamTimeout { upstream: u64, request: u64 },
}

/// Validate a fully layered configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    match Url::parse(&config.upstream.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
        _ => errors.push(ValidationError::UpstreamUrl(config.upstream.base_url.clone())),
    }

    let positive: [(&'static str, u64); 6] = [
        ("upstream.timeout_secs", config.upstream.timeout_secs),
        ("upstream.connect_timeout_secs", config.upstream.connect_timeout_secs),
        ("rate_limit.window_ms", config.rate_limit.window_ms),
        ("rate_limit.auth_max", u64::from(config.rate_limit.auth_max)),
        ("rate_limit.api_max", u64::from(config.rate_limit.api_max)),
        ("timeouts.request_secs", config.timeouts.request_secs),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero(field));
        }
    }

    // Otherwise the edge timeout fires first and the caller never sees the 504.
    if config.upstream.timeout_secs >= config.timeouts.request_secs {
        errors.push(ValidationError::UpstreamTimeout {
            upstream: config.upstream.timeout_secs,
            request: config.timeouts.request_secs,
        });
    }

    if config.rate_limit.sweep_interval_secs == 0 {
        errors.push(ValidationError::Zero("rate_limit.sweep_interval_secs"));
    }

    if !config.rate_limit.auth_prefix.starts_with("/api/") {
        errors.push(ValidationError::AuthPrefix(config.rate_limit.auth_prefix.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
