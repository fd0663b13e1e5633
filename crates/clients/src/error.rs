//! Error types for the HTTP collaborators.

use std::time::Duration;
use thiserror::Error;

/// Errors raised by the chat, store and enrichment clients.
///
/// `Display` never includes request URLs, headers or API keys, so these
/// errors can be logged and surfaced as-is.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Missing or invalid configuration (unset env var, bad header value).
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport failure. The wrapped error has its URL stripped.
    #[error("{service} request failed: {source}")]
    Http {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} timed out after {timeout:?}")]
    Timeout {
        service: &'static str,
        timeout: Duration,
    },

    /// Non-success HTTP status.
    #[error("{service} returned HTTP {status}")]
    Status { service: &'static str, status: u16 },

    /// The service answered but the body was not what we expected.
    #[error("{service} returned a malformed response: {reason}")]
    MalformedResponse {
        service: &'static str,
        reason: String,
    },
}

impl ClientError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Wrap a transport error, dropping the URL it carries.
    pub fn http(service: &'static str, error: reqwest::Error, timeout: Duration) -> Self {
        if error.is_timeout() {
            return Self::Timeout { service, timeout };
        }
        Self::Http {
            service,
            source: error.without_url(),
        }
    }

    pub fn malformed(service: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            service,
            reason: reason.into(),
        }
    }

    /// Whether a retry could plausibly succeed: network failures, timeouts,
    /// 429 and 5xx. Everything else is deterministic.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Config(_) => false,
            Self::Http { source, .. } => source.is_connect() || source.is_request(),
            Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::MalformedResponse { .. } => false,
        }
    }

    /// Short error code for logging.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_error",
            Self::Http { .. } => "http_error",
            Self::Timeout { .. } => "timeout",
            Self::Status { .. } => "http_status",
            Self::MalformedResponse { .. } => "malformed_response",
        }
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_retryability() {
        let throttled = ClientError::Status { service: "llm", status: 429 };
        let server = ClientError::Status { service: "llm", status: 503 };
        let bad_request = ClientError::Status { service: "llm", status: 400 };

        assert!(throttled.is_retryable());
        assert!(server.is_retryable());
        assert!(!bad_request.is_retryable());
        assert!(!ClientError::malformed("llm", "no choices").is_retryable());
        assert!(ClientError::Timeout { service: "llm", timeout: Duration::from_secs(1) }.is_retryable());
    }

    #[test]
    fn test_display_has_no_url() {
        let err = ClientError::Status { service: "supabase", status: 401 };
        assert_eq!(err.to_string(), "supabase returned HTTP 401");
        assert_eq!(err.code(), "http_status");
    }
}
