use std::borrow::Cow;
use std::time::Duration;
use thiserror::Error;

/// Longest slice of an error body shown when a [`GatewayError`] is displayed (1 KiB).
///
/// The full body stays available through [`GatewayError::body`].
pub const ERROR_BODY_PREVIEW_LIMIT: usize = 1024;

/// Bounded excerpt of an error body for messages and logs, cut on a char boundary.
#[must_use]
pub fn body_preview(body: &str) -> Cow<'_, str> {
    if body.len() <= ERROR_BODY_PREVIEW_LIMIT {
        return Cow::Borrowed(body);
    }
    let mut end = ERROR_BODY_PREVIEW_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    let head = body.get(..end).unwrap_or_default();
    Cow::Owned(format!("{head}... ({} bytes total)", body.len()))
}

/// Classification of URL validation failures.
///
/// Provides programmatic matching for different failure modes without
/// relying on unstable error message strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidUriKind {
    /// URL could not be parsed (malformed syntax)
    ParseError,
    /// URL is missing required host/authority component
    MissingAuthority,
    /// URL is missing required scheme (http/https)
    MissingScheme,
}

/// Coarse classification of a [`GatewayError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The request could not be constructed (URL, header, encoding)
    Request,
    /// Network, TLS or timeout failure; no response was received
    Transport,
    /// The server answered with a non-2xx status
    Status,
    /// The response body could not be read or decoded
    Body,
}

/// Normalized gateway error
///
/// Every request issued through the gateway completes with either a
/// successful response or exactly one of these.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GatewayError {
    /// Request building failed
    #[error("Failed to build request: {0}")]
    RequestBuild(#[from] http::Error),

    /// Invalid header name
    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    /// Invalid header value
    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    /// No response within the per-request timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Transport error (DNS, connection refused, reset, ...)
    #[error("Transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// TLS error
    #[error("TLS error: {0}")]
    Tls(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Response body exceeded size limit
    #[error("Response body too large: limit {limit} bytes, got {actual} bytes")]
    BodyTooLarge { limit: usize, actual: usize },

    /// HTTP non-2xx status, body passed through unmodified
    ///
    /// `Display` shows only a [`body_preview`] of the body.
    #[error("HTTP {status}: {}", body_preview(.body))]
    HttpStatus {
        status: http::StatusCode,
        body: String,
        content_type: Option<String>,
        /// Parsed `Retry-After` header value, if present and valid
        retry_after: Option<Duration>,
    },

    /// JSON serialization or parsing error
    #[error("JSON processing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Query string or form URL encoding error
    #[error("URL encoding failed: {0}")]
    UrlEncode(#[from] serde_urlencoded::ser::Error),

    /// Request buffer is full (fail-fast)
    #[error("Gateway overloaded: request buffer is full")]
    Overloaded,

    /// Internal service failure (buffer worker died, channel closed)
    #[error("Gateway unavailable: internal failure")]
    ServiceClosed,

    /// Invalid URL (failed to parse)
    ///
    /// Use the `kind` field for programmatic matching. The `reason` field contains
    /// a diagnostic message intended for logging only.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUri {
        /// The URL that failed to parse
        url: String,
        /// Structured failure classification for programmatic matching
        kind: InvalidUriKind,
        /// Diagnostic message (unstable format, for logging only)
        reason: String,
    },

    /// Invalid URL scheme for transport security configuration
    #[error("URL scheme '{scheme}' not allowed: {reason}")]
    InvalidScheme {
        /// The URL scheme that was rejected
        scheme: String,
        /// Reason the scheme was rejected
        reason: String,
    },
}

impl GatewayError {
    /// Classify the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RequestBuild(_)
            | Self::InvalidHeaderName(_)
            | Self::InvalidHeaderValue(_)
            | Self::UrlEncode(_)
            | Self::InvalidUri { .. }
            | Self::InvalidScheme { .. } => ErrorKind::Request,
            Self::Timeout(_)
            | Self::Transport(_)
            | Self::Tls(_)
            | Self::Overloaded
            | Self::ServiceClosed => ErrorKind::Transport,
            Self::HttpStatus { .. } => ErrorKind::Status,
            Self::BodyTooLarge { .. } | Self::Json(_) => ErrorKind::Body,
        }
    }

    /// `true` when no response was received (network, TLS, timeout).
    #[must_use]
    pub fn is_transport(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }

    /// HTTP status code, for [`GatewayError::HttpStatus`].
    #[must_use]
    pub fn status(&self) -> Option<http::StatusCode> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response body, for [`GatewayError::HttpStatus`].
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::HttpStatus { body, .. } => Some(body),
            _ => None,
        }
    }
}

impl From<hyper::Error> for GatewayError {
    fn from(err: hyper::Error) -> Self {
        GatewayError::Transport(Box::new(err))
    }
}

impl From<hyper_util::client::legacy::Error> for GatewayError {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        GatewayError::Transport(Box::new(err))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::error::Error;
    use std::fmt;

    #[derive(Debug)]
    struct TestError(&'static str);

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl Error for TestError {}

    #[test]
    fn test_transport_error_preserves_source() {
        let err = GatewayError::Transport(Box::new(TestError("connection refused")));

        let source = err.source().expect("Transport error should have a source");
        let downcast = source.downcast_ref::<TestError>();
        assert_eq!(downcast.map(|e| e.0), Some("connection refused"));
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.is_transport());
    }

    #[test]
    fn test_http_status_exposes_status_and_body() {
        let err = GatewayError::HttpStatus {
            status: http::StatusCode::NOT_FOUND,
            body: r#"{"error":"App not found"}"#.to_owned(),
            content_type: Some("application/json".to_owned()),
            retry_after: None,
        };

        assert_eq!(err.kind(), ErrorKind::Status);
        assert!(!err.is_transport());
        assert_eq!(err.status(), Some(http::StatusCode::NOT_FOUND));
        assert_eq!(err.body(), Some(r#"{"error":"App not found"}"#));
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_display_truncates_large_body() {
        let body = "x".repeat(ERROR_BODY_PREVIEW_LIMIT * 4);
        let err = GatewayError::HttpStatus {
            status: http::StatusCode::INTERNAL_SERVER_ERROR,
            body: body.clone(),
            content_type: None,
            retry_after: None,
        };

        let shown = err.to_string();
        assert!(shown.len() < ERROR_BODY_PREVIEW_LIMIT + 64, "{}", shown.len());
        assert!(shown.ends_with(&format!("... ({} bytes total)", body.len())));
        assert_eq!(err.body().map(str::len), Some(body.len()));
    }

    #[test]
    fn test_body_preview_respects_char_boundaries() {
        let body = format!("{}\u{e9}tail", "a".repeat(ERROR_BODY_PREVIEW_LIMIT - 1));
        let preview = body_preview(&body);
        assert!(preview.starts_with(&"a".repeat(ERROR_BODY_PREVIEW_LIMIT - 1)));
        assert!(!preview.contains('\u{e9}'));
        assert_eq!(body_preview("short"), "short");
    }

    #[test]
    fn test_timeout_is_transport_kind() {
        let err = GatewayError::Timeout(Duration::from_millis(5000));
        assert!(err.is_transport());
        assert_eq!(err.status(), None);
        assert_eq!(err.body(), None);
    }

    #[test]
    fn test_request_errors_are_not_transport() {
        let err = GatewayError::InvalidScheme {
            scheme: "ftp".to_owned(),
            reason: "unsupported".to_owned(),
        };
        assert_eq!(err.kind(), ErrorKind::Request);
        assert!(!err.is_transport());
    }
}
