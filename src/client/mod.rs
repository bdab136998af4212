//! Client-side request helper for the gateway's API.
//!
//! Requests always carry credentials: the client keeps a cookie jar, so
//! http-only cookies set through the gateway are sent back automatically.

pub mod body;

use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;
use thiserror::Error;

pub use body::{error_message, parse_body, ApiBody};

/// Errors returned by [`ApiClient`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-success status.
    #[error("{message}")]
    Status {
        status: u16,
        message: String,
        body: ApiBody,
    },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Join a path onto an optional base.
///
/// Without a base the path is returned untouched (same-origin request).
pub fn api_url(base: Option<&str>, path: &str) -> String {
    let base = base.map(|b| b.strip_suffix('/').unwrap_or(b)).unwrap_or("");
    if base.is_empty() {
        return path.to_string();
    }
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// Cookie-carrying JSON client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base: String,
}

impl ApiClient {
    /// Client for the gateway at `base`, sending `headers` on every request.
    pub fn new(base: &str, headers: HeaderMap) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .build()?;
        Ok(Self {
            client,
            base: base.to_string(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        api_url(Some(&self.base), path)
    }

    /// Send a request and read the body exactly once.
    pub async fn request(&self, method: Method, path: &str, json: Option<&Value>) -> Result<ApiBody, ApiError> {
        let mut builder = self.client.request(method, self.url(path));
        if let Some(json) = json {
            builder = builder.json(json);
        }

        let response = builder.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = response.text().await?;
        let body = parse_body(content_type.as_deref(), text);

        if status.is_success() {
            Ok(body)
        } else {
            Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(status.as_u16(), &body),
                body,
            })
        }
    }

    pub async fn get(&self, path: &str) -> Result<ApiBody, ApiError> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, json: &Value) -> Result<ApiBody, ApiError> {
        self.request(Method::POST, path, Some(json)).await
    }
}
