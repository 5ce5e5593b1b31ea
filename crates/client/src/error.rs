//! Errors from the REST layer and interpretation of backend error bodies.

/// Errors from the studio REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("{message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body.
        message: String,
    },

    /// A 2xx response whose body did not match the expected shape.
    #[error("Malformed response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status code, when the backend answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Request(e) => e.status().map(|s| s.as_u16()),
            ApiError::Decode(_) => None,
        }
    }

    /// Network failures, timeouts and 5xx responses. A poll loop retries
    /// these on its next tick.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Request(_) => true,
            ApiError::Status { status, .. } => *status >= 500,
            ApiError::Decode(_) => false,
        }
    }

    /// 4xx responses carrying validation detail.
    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Status { status, .. } if (400..500).contains(status))
    }
}

/// Extract a human-readable message from an error response body.
///
/// Only bodies served as `application/json` are parsed: they use their
/// `detail` field (a string, or an array of `{msg}` items joined with
/// `"; "`), and a bare JSON string is used as-is. Other bodies are used
/// trimmed. Anything else falls back to `Request failed: <status>`.
pub fn error_message(status: u16, content_type: &str, body: &str) -> String {
    let fallback = format!("Request failed: {status}");

    if !content_type.contains("application/json") {
        return text_message(body).unwrap_or(fallback);
    }

    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::String(s)) if !s.is_empty() => s,
        Ok(serde_json::Value::Object(map)) => match map.get("detail") {
            Some(serde_json::Value::String(s)) if !s.is_empty() => s.clone(),
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .map(|item| match item.get("msg").and_then(|m| m.as_str()) {
                    Some(msg) => msg.to_string(),
                    None => item.to_string(),
                })
                .collect::<Vec<_>>()
                .join("; "),
            Some(serde_json::Value::String(_))
            | Some(serde_json::Value::Null)
            | Some(serde_json::Value::Bool(false))
            | None => fallback,
            Some(other) => other.to_string(),
        },
        Ok(_) => fallback,
        Err(_) => text_message(body).unwrap_or(fallback),
    }
}

fn text_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
