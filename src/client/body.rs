//! Defensive response body handling.
//!
//! A response body is read once, as text. JSON decoding is only attempted
//! when the content type or the first character says so, and a failed
//! decode falls back to the raw text.

use serde_json::Value;

/// A response body after the single read.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiBody {
    /// Decoded JSON, with the text it was decoded from.
    Json { value: Value, raw: String },
    Text(String),
}

impl ApiBody {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ApiBody::Json { value, .. } => Some(value),
            ApiBody::Text(_) => None,
        }
    }

    /// The body exactly as received.
    pub fn raw(&self) -> &str {
        match self {
            ApiBody::Json { raw, .. } => raw,
            ApiBody::Text(text) => text,
        }
    }
}

fn looks_like_json(content_type: Option<&str>, text: &str) -> bool {
    let declared = content_type
        .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
        .unwrap_or(false);
    let trimmed = text.trim_start();
    declared || trimmed.starts_with('{') || trimmed.starts_with('[')
}

/// Interpret a body that has already been read as text.
pub fn parse_body(content_type: Option<&str>, text: String) -> ApiBody {
    if looks_like_json(content_type, &text) {
        if let Ok(value) = serde_json::from_str(&text) {
            return ApiBody::Json { value, raw: text };
        }
    }
    ApiBody::Text(text)
}

/// Human readable failure message for a non-success response.
///
/// Preference: `error` field, `message` field, raw text, generic status line.
pub fn error_message(status: u16, body: &ApiBody) -> String {
    if let Some(value) = body.as_json() {
        for field in ["error", "message"] {
            if let Some(msg) = value.get(field).and_then(Value::as_str) {
                if !msg.is_empty() {
                    return msg.to_string();
                }
            }
        }
    }

    let raw = body.raw();
    if raw.trim().is_empty() {
        format!("Request failed ({})", status)
    } else {
        raw.to_string()
    }
}
