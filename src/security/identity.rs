//! Route classification and client identity extraction.
//!
//! Both are total functions: malformed or missing headers never fail,
//! they degrade to the shared `unknown` bucket.

use std::fmt;

use axum::http::HeaderMap;

/// Header carrying the proxy chain, client first.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Header set by a fronting proxy with the peer address.
pub const X_REAL_IP: &str = "x-real-ip";

/// Identity shared by every client that presents no identifying header.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Coarse bucket used to pick a rate ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    /// Authentication routes (login, register, refresh...).
    Auth,
    /// Every other API route.
    Api,
}

impl RouteClass {
    /// Classify a request path by prefix.
    pub fn classify(path: &str, auth_prefix: &str) -> Self {
        if path.starts_with(auth_prefix) {
            RouteClass::Auth
        } else {
            RouteClass::Api
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteClass::Auth => "auth",
            RouteClass::Api => "api",
        }
    }
}

impl fmt::Display for RouteClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Extract the client identity used as the rate limit key.
///
/// Order: first `x-forwarded-for` hop, then `x-real-ip`, then `unknown`.
pub fn client_identity(headers: &HeaderMap) -> String {
    let forwarded = header_str(headers, X_FORWARDED_FOR)
        .and_then(|chain| chain.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    header_str(headers, X_REAL_IP)
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

/// Composite store key: `<class>:<identity>`.
pub fn rate_key(class: RouteClass, identity: &str) -> String {
    format!("{}:{}", class.as_str(), identity)
}
