//! Outbound request construction.
//!
//! # Responsibilities
//! - Rewrite the target to upstream base + original path + query
//! - Drop headers tied to the inbound connection (`host`, framing)
//! - Carry cookies across the hop
//! - Never attach a body to GET/HEAD
//! - Ask for an identity-encoded HEAD so its `content-length` matches
//!   the decoded body a GET through the gateway returns
//!
//! # Design Decisions
//! - The outbound client sets `host`, `content-length` and `accept-encoding`
//!   for the new connection
//! - Body bytes are forwarded unmodified, no size limit here

use axum::{
    body::Bytes,
    http::{header, HeaderMap, HeaderValue, Method, Uri},
};

/// Request headers owned by the inbound connection.
const CONNECTION_SCOPED_HEADERS: [header::HeaderName; 5] = [
    header::HOST,
    header::CONNECTION,
    header::TRANSFER_ENCODING,
    header::CONTENT_LENGTH,
    header::ACCEPT_ENCODING,
];

/// Methods that never carry a forwarded body.
pub fn is_bodyless(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}

/// A request ready to be sent upstream.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl ProxyRequest {
    /// Build the outbound request. `base` must already be normalized
    /// (no trailing slash).
    pub fn new(base: &str, method: &Method, uri: &Uri, headers: &HeaderMap, body: Option<Bytes>) -> Self {
        let method = uppercase(method);
        let body = if is_bodyless(&method) { None } else { body };

        let mut headers = outbound_headers(headers);
        if method == Method::HEAD {
            headers.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("identity"));
        }

        Self {
            url: target_url(base, uri),
            headers,
            method,
            body,
        }
    }
}

fn uppercase(method: &Method) -> Method {
    let upper = method.as_str().to_ascii_uppercase();
    Method::from_bytes(upper.as_bytes()).unwrap_or_else(|_| method.clone())
}

/// `base + path + ?query`.
pub fn target_url(base: &str, uri: &Uri) -> String {
    match uri.query().filter(|q| !q.is_empty()) {
        Some(query) => format!("{}{}?{}", base, uri.path(), query),
        None => format!("{}{}", base, uri.path()),
    }
}

fn outbound_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = inbound.clone();
    for name in CONNECTION_SCOPED_HEADERS {
        headers.remove(name);
    }

    // HTTP/2 callers may split cookies across several header lines; the
    // upstream gets a single `cookie` header joined with "; ".
    let cookies: Vec<&str> = inbound
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    if !cookies.is_empty() {
        if let Ok(joined) = HeaderValue::from_str(&cookies.join("; ")) {
            headers.insert(header::COOKIE, joined);
        }
    }

    headers
}
