//! Error types for node execution.

use std::time::Duration;

/// Errors that can occur while generating a video for a workflow item.
#[derive(Debug, thiserror::Error)]
pub enum VeoNodeError {
    /// API key missing, unknown credential, or rejected by the API.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Sanitized error message from the response body.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Delay suggested by the `Retry-After` header.
        retry_after: Option<Duration>,
    },

    /// Polling gave up before the operation completed.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// Polling was aborted through the cancellation signal.
    #[error("operation cancelled")]
    Cancelled,

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 video data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., reading input items).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The operation response did not have the expected structure.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// The remote operation finished with an error.
    #[error("video generation failed: {0}")]
    VideoGeneration(String),
}

impl VeoNodeError {
    /// Returns true if this error is likely transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Timeout(_) | Self::Network(_)
        )
    }

    /// Returns the suggested retry delay, if available.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            Self::Timeout(_) => Some(Duration::from_secs(1)),
            Self::Network(_) => Some(Duration::from_secs(2)),
            _ => None,
        }
    }
}

/// Result type alias for node operations.
pub type Result<T> = std::result::Result<T, VeoNodeError>;

const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Redacts API keys from an upstream error body and caps its length.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let mut out = String::with_capacity(text.len().min(MAX_ERROR_MESSAGE_LEN));
    let mut rest = text;

    // Google API keys start with "AIza" and are 39 characters long.
    while let Some(pos) = rest.find("AIza") {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let key_len = tail
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(tail.len());
        out.push_str("[REDACTED]");
        rest = &tail[key_len..];
    }
    out.push_str(rest);

    let trimmed = out.trim();
    if trimmed.chars().count() > MAX_ERROR_MESSAGE_LEN {
        let cut: String = trimmed.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
        format!("{cut}...")
    } else {
        trimmed.to_string()
    }
}

/// Reads a `Retry-After` header expressed in whole seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}
