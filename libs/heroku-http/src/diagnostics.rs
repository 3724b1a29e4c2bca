//! Operator-visible diagnostics for gateway traffic.
//!
//! The gateway reports every transport-level failure to a [`Diagnostics`]
//! implementation before handing the error back to the caller. The default,
//! [`TracingDiagnostics`], writes `tracing` events; tests and hosts can inject
//! their own via [`GatewayBuilder::diagnostics`](crate::GatewayBuilder::diagnostics).

use std::time::Duration;

use http::{Method, StatusCode};

use crate::error::GatewayError;

/// A request that failed before a response was received.
#[derive(Debug)]
pub struct TransportFailure<'a> {
    pub method: &'a Method,
    /// Target URL without its query string
    pub url: &'a str,
    pub error: &'a GatewayError,
    pub elapsed: Duration,
}

/// A request that received a response head (any status).
#[derive(Debug)]
pub struct CompletedRequest<'a> {
    pub method: &'a Method,
    /// Target URL without its query string
    pub url: &'a str,
    pub status: StatusCode,
    pub elapsed: Duration,
}

/// Sink for gateway diagnostics.
pub trait Diagnostics: Send + Sync + 'static {
    /// Called once for every transport failure (connection, TLS, timeout).
    fn transport_failure(&self, failure: &TransportFailure<'_>);

    /// Called once for every request that produced a response.
    fn request_completed(&self, _completed: &CompletedRequest<'_>) {}
}

/// Default diagnostics sink writing to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn transport_failure(&self, failure: &TransportFailure<'_>) {
        tracing::warn!(
            target: "heroku_http::diagnostics",
            method = %failure.method,
            url = failure.url,
            elapsed_ms = u64::try_from(failure.elapsed.as_millis()).unwrap_or(u64::MAX),
            error = %failure.error,
            "transport failure"
        );
    }

    fn request_completed(&self, completed: &CompletedRequest<'_>) {
        tracing::debug!(
            target: "heroku_http::diagnostics",
            method = %completed.method,
            url = completed.url,
            status = completed.status.as_u16(),
            elapsed_ms = u64::try_from(completed.elapsed.as_millis()).unwrap_or(u64::MAX),
            "request completed"
        );
    }
}

/// Strip the query string so parameters (which may carry secrets, e.g. the
/// login exchange) never reach a diagnostics sink.
pub(crate) fn sanitize_uri(uri: &http::Uri) -> String {
    format!(
        "{}://{}{}",
        uri.scheme_str().unwrap_or("https"),
        uri.authority().map_or("", http::uri::Authority::as_str),
        uri.path()
    )
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn sanitize_uri_drops_query() {
        let uri: http::Uri = "https://api.heroku.com/login?username=a&password=b"
            .parse()
            .unwrap();
        assert_eq!(sanitize_uri(&uri), "https://api.heroku.com/login");
    }

    #[test]
    fn sanitize_uri_keeps_port() {
        let uri: http::Uri = "http://127.0.0.1:8080/apps".parse().unwrap();
        assert_eq!(sanitize_uri(&uri), "http://127.0.0.1:8080/apps");
    }
}
