//! Response handling and transformation.
//!
//! # Responsibilities
//! - Translate the buffered upstream response for the caller
//! - Strip hop-by-hop headers the new connection re-applies
//! - Keep every `set-cookie` as its own header line
//! - Synthesize the gateway's own responses (429, errors)
//!
//! # Design Decisions
//! - Body is fully buffered; the server re-frames it
//! - Status code and HTTP/1.1 reason phrase are relayed unchanged

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use hyper::ext::ReasonPhrase;
use serde_json::json;

/// Upstream response headers never relayed verbatim.
///
/// `content-length` is relayed: the outbound client removes it whenever it
/// decodes a compressed body, so a surviving value always matches the bytes
/// (or, for HEAD, the bytes a GET would return).
pub const EXCLUDED_RESPONSE_HEADERS: [header::HeaderName; 3] = [
    header::TRANSFER_ENCODING,
    header::CONTENT_ENCODING,
    header::CONNECTION,
];

/// A buffered upstream response.
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: StatusCode,
    /// Non-canonical HTTP/1.1 reason phrase sent by the upstream, if any.
    pub reason: Option<ReasonPhrase>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ProxyResponse {
    /// Headers to send back to the caller.
    pub fn client_headers(&self) -> HeaderMap {
        let mut out = HeaderMap::with_capacity(self.headers.len());

        for (name, value) in self.headers.iter() {
            if EXCLUDED_RESPONSE_HEADERS.contains(name) || name == header::SET_COOKIE {
                continue;
            }
            out.append(name.clone(), value.clone());
        }

        // One line per cookie, in upstream order.
        out.remove(header::SET_COOKIE);
        for cookie in self.headers.get_all(header::SET_COOKIE) {
            out.append(header::SET_COOKIE, cookie.clone());
        }

        out
    }
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        let headers = self.client_headers();
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = headers;
        if let Some(reason) = self.reason {
            response.extensions_mut().insert(reason);
        }
        response
    }
}

/// JSON error body `{"error": "<message>"}` with the given status.
pub fn error_json(status: StatusCode, message: &str) -> Response {
    let body = json!({ "error": message }).to_string();
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

/// The admission rejection: 429, JSON body and `retry-after` in seconds.
pub fn too_many_requests(retry_after_secs: u64) -> Response {
    let mut response = error_json(StatusCode::TOO_MANY_REQUESTS, "Too Many Requests");
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs.max(1)));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn upstream(headers: &[(&'static str, &'static str)]) -> ProxyResponse {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.append(*name, HeaderValue::from_static(*value));
        }
        ProxyResponse {
            status: StatusCode::OK,
            reason: None,
            headers: map,
            body: Bytes::from_static(b"{\"ok\":true}"),
        }
    }

    #[tokio::test]
    async fn test_rejection_is_bit_exact() {
        let response = too_many_requests(42);
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["content-type"], "application/json");
        assert_eq!(response.headers()["retry-after"], "42");
        assert_eq!(body_string(response).await, r#"{"error":"Too Many Requests"}"#);
    }

    #[test]
    fn test_retry_after_floor() {
        assert_eq!(too_many_requests(0).headers()["retry-after"], "1");
    }

    #[test]
    fn test_set_cookies_stay_separate() {
        let response = upstream(&[
            ("set-cookie", "a=1; Path=/; HttpOnly"),
            ("content-type", "application/json"),
            ("set-cookie", "b=2; Path=/"),
        ]);
        let headers = response.client_headers();
        let cookies: Vec<_> = headers.get_all("set-cookie").iter().collect();
        assert_eq!(cookies, vec!["a=1; Path=/; HttpOnly", "b=2; Path=/"]);
        assert_eq!(headers["content-type"], "application/json");
    }

    #[test]
    fn test_hop_by_hop_headers_are_stripped() {
        let response = upstream(&[
            ("transfer-encoding", "chunked"),
            ("content-encoding", "gzip"),
            ("connection", "keep-alive"),
            ("cache-control", "no-store"),
        ]);
        let headers = response.client_headers();
        assert!(headers.get("transfer-encoding").is_none());
        assert!(headers.get("content-encoding").is_none());
        assert!(headers.get("connection").is_none());
        assert_eq!(headers["cache-control"], "no-store");
    }

    #[test]
    fn test_content_length_is_relayed() {
        let response = upstream(&[("content-length", "1234")]);
        assert_eq!(response.client_headers()["content-length"], "1234");
    }

    #[test]
    fn test_custom_reason_phrase_rides_along() {
        let mut response = upstream(&[]);
        response.reason = Some(ReasonPhrase::from_static(b"Custom Reason"));

        let out = response.into_response();
        let reason = out.extensions().get::<ReasonPhrase>().unwrap();
        assert_eq!(reason.as_bytes(), b"Custom Reason");
    }

    #[tokio::test]
    async fn test_redirect_status_and_location_are_relayed() {
        let mut response = upstream(&[("location", "/login?next=%2Fdashboard")]);
        response.status = StatusCode::FOUND;
        response.body = Bytes::new();

        let out = response.into_response();
        assert_eq!(out.status(), StatusCode::FOUND);
        assert_eq!(out.headers()["location"], "/login?next=%2Fdashboard");
        assert_eq!(body_string(out).await, "");
    }
}
