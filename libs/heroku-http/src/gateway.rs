use crate::builder::GatewayBuilder;
use crate::config::TransportSecurity;
use crate::credential::Credential;
use crate::diagnostics::Diagnostics;
use crate::error::GatewayError;
use crate::layers::BasicAuthLayer;
use crate::request::RequestBuilder;
use crate::response::ResponseBody;
use bytes::Bytes;
use http::{Method, Request, Response};
use http_body_util::Full;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tower::Service;
use tower::buffer::Buffer;
use url::Url;

/// Future type of the service behind the buffer
pub type ServiceFuture =
    Pin<Box<dyn Future<Output = Result<Response<ResponseBody>, GatewayError>> + Send>>;

/// Buffered transport shared by all clones of a gateway
pub type BufferedService = Buffer<Request<Full<Bytes>>, ServiceFuture>;

/// Single request factory for the platform API
///
/// Every outbound call is built from a gateway, which merges in the fixed
/// headers, the per-request timeout and (when present) the gateway's
/// [`Credential`], and normalizes failures into [`GatewayError`].
///
/// `RequestGateway` is `Clone + Send + Sync`. Clones share one connection pool
/// through an internal `tower::buffer::Buffer`; no external locking is needed.
///
/// # Example
///
/// ```ignore
/// let anonymous = RequestGateway::new()?;
/// let gateway = anonymous.with_credential(Credential::from_api_key("abc123")?)?;
///
/// let account: serde_json::Value = gateway.get("/account").send().await?.json().await?;
/// ```
#[derive(Clone)]
pub struct RequestGateway {
    pub(crate) service: BufferedService,
    pub(crate) base_url: Url,
    pub(crate) credential: Option<Credential>,
    pub(crate) auth: Option<BasicAuthLayer>,
    pub(crate) max_body_size: usize,
    pub(crate) transport_security: TransportSecurity,
    pub(crate) request_timeout: Duration,
    pub(crate) diagnostics: Arc<dyn Diagnostics>,
}

impl RequestGateway {
    /// Create a gateway with default configuration and no credential
    ///
    /// # Errors
    /// Returns an error if TLS initialization fails
    pub fn new() -> Result<Self, GatewayError> {
        GatewayBuilder::new().build()
    }

    /// Create a builder for configuring the gateway
    #[must_use]
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::new()
    }

    /// Return a gateway that authenticates every request with `credential`.
    ///
    /// The returned gateway shares this one's transport; `self` keeps its own
    /// credential (or lack of one).
    ///
    /// # Errors
    /// Returns `GatewayError::InvalidHeaderValue` if the credential cannot be
    /// encoded as a header value.
    pub fn with_credential(&self, credential: Credential) -> Result<Self, GatewayError> {
        let auth = BasicAuthLayer::try_new(&credential)?;
        Ok(Self {
            credential: Some(credential),
            auth: Some(auth),
            ..self.clone()
        })
    }

    /// Return a gateway sharing this transport that sends no `Authorization` header.
    #[must_use]
    pub fn without_credential(&self) -> Self {
        Self {
            credential: None,
            auth: None,
            ..self.clone()
        }
    }

    /// Credential attached to this gateway, if any
    #[must_use]
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Base endpoint that relative paths resolve against
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Deadline for a whole request, from buffer admission to the last byte
    /// of an error body
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Create a request builder for an arbitrary method.
    ///
    /// `url` is either a path (`/apps/app1`), resolved against the base
    /// endpoint with its path prefix kept, or an absolute `http(s)://` URL.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        RequestBuilder::new(
            self.service.clone(),
            self.auth.clone(),
            self.max_body_size,
            method,
            self.resolve(url),
            self.transport_security,
            self.request_timeout,
            Arc::clone(&self.diagnostics),
        )
    }

    /// Start a `GET` request.
    ///
    /// ```ignore
    /// let apps: serde_json::Value = gateway.get("/apps").send().await?.json().await?;
    /// ```
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    /// Start a `POST` request.
    ///
    /// ```ignore
    /// gateway.post("/apps").query(&[("name", "app1")])?.send().await?;
    /// ```
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    /// Start a `PUT` request.
    ///
    /// ```ignore
    /// gateway.put("/apps/app1/config_vars").json(&vars)?.send().await?;
    /// ```
    pub fn put(&self, url: &str) -> RequestBuilder {
        self.request(Method::PUT, url)
    }

    /// Start a `PATCH` request.
    pub fn patch(&self, url: &str) -> RequestBuilder {
        self.request(Method::PATCH, url)
    }

    /// Start a `DELETE` request.
    ///
    /// ```ignore
    /// gateway.delete("/apps/app1/domains/www.example.com").send().await?;
    /// ```
    pub fn delete(&self, url: &str) -> RequestBuilder {
        self.request(Method::DELETE, url)
    }

    fn resolve(&self, url: &str) -> String {
        if has_scheme(url) {
            return url.to_owned();
        }
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }
}

impl fmt::Debug for RequestGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestGateway")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.credential.is_some())
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

/// `true` for `scheme://...`; anything else is treated as a path.
fn has_scheme(url: &str) -> bool {
    url.split_once("://").is_some_and(|(scheme, _)| {
        scheme.starts_with(|c: char| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Map buffer errors to `GatewayError`
///
/// Errors from the inner stack are unboxed unchanged; anything else means the
/// buffer worker is gone.
pub(crate) fn map_buffer_error(err: tower::BoxError) -> GatewayError {
    match err.downcast::<GatewayError>() {
        Ok(gateway_err) => *gateway_err,
        Err(err) => {
            tracing::error!(
                error = %err,
                "buffer worker closed unexpectedly; gateway unavailable"
            );
            GatewayError::ServiceClosed
        }
    }
}

/// Poll the buffer once for a free slot; `Overloaded` instead of waiting when full.
pub(crate) async fn try_acquire_buffer_slot(
    service: &mut BufferedService,
) -> Result<(), GatewayError> {
    use std::task::Poll;

    let poll_result = std::future::poll_fn(|cx| match service.poll_ready(cx) {
        Poll::Ready(result) => Poll::Ready(Some(result)),
        Poll::Pending => Poll::Ready(None),
    })
    .await;

    match poll_result {
        Some(Ok(())) => Ok(()),
        Some(Err(e)) => Err(map_buffer_error(e)),
        None => Err(GatewayError::Overloaded),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use httpmock::prelude::*;
    use serde_json::json;

    fn test_gateway(server: &MockServer) -> RequestGateway {
        GatewayBuilder::with_config(GatewayConfig::for_testing())
            .base_url(Url::parse(&server.base_url()).unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn test_gateway_is_send_sync_clone() {
        fn assert_traits<T: Send + Sync + Clone>() {}
        assert_traits::<RequestGateway>();
    }

    #[test]
    fn test_has_scheme() {
        assert!(has_scheme("https://api.heroku.com/apps"));
        assert!(has_scheme("http://127.0.0.1:8080"));
        assert!(has_scheme("ftp://example.com"));
        assert!(!has_scheme("/apps"));
        assert!(!has_scheme("apps/app1"));
        assert!(!has_scheme("/apps?next=http://x"));
    }

    #[tokio::test]
    async fn test_relative_path_resolves_against_base() {
        let gateway = GatewayBuilder::new()
            .base_url(Url::parse("https://api.example.com/v3/").unwrap())
            .build()
            .unwrap();
        assert_eq!(gateway.resolve("/apps"), "https://api.example.com/v3/apps");
        assert_eq!(gateway.resolve("apps"), "https://api.example.com/v3/apps");
        assert_eq!(
            gateway.resolve("https://other.example.com/x"),
            "https://other.example.com/x"
        );
    }

    #[tokio::test]
    async fn test_get_relative_path() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/user");
            then.status(200).json_body(json!({"email": "ops@example.com"}));
        });

        let gateway = test_gateway(&server);
        let resp = gateway.get("/user").send().await.unwrap();
        assert_eq!(resp.status(), http::StatusCode::OK);
        mock.assert();
    }

    #[tokio::test]
    async fn test_with_credential_leaves_source_anonymous() {
        let server = MockServer::start();
        let authed = server.mock(|when, then| {
            when.method(GET)
                .path("/account")
                .header("authorization", "Basic YWJjMTIz");
            then.status(200).json_body(json!({}));
        });
        let anonymous = server.mock(|when, then| {
            when.method(GET).path("/account").header_missing("authorization");
            then.status(401).json_body(json!({"id": "unauthorized"}));
        });

        let gateway = test_gateway(&server);
        let with_key = gateway
            .with_credential(Credential::from_api_key("abc123").unwrap())
            .unwrap();

        with_key.get("/account").send().await.unwrap();
        let err = gateway.get("/account").send().await.unwrap_err();
        assert_eq!(err.status(), Some(http::StatusCode::UNAUTHORIZED));

        let err = with_key
            .without_credential()
            .get("/account")
            .send()
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(http::StatusCode::UNAUTHORIZED));

        authed.assert_hits(1);
        anonymous.assert_hits(2);
    }

    #[tokio::test]
    async fn test_http_rejected_when_tls_only() {
        let gateway = GatewayBuilder::new().build().unwrap();
        let err = gateway
            .get("http://127.0.0.1:1/user")
            .send()
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidScheme { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn test_debug_hides_credential() {
        let gateway = GatewayBuilder::new()
            .credential(Credential::from_api_key("hidden-key").unwrap())
            .build()
            .unwrap();
        let dbg = format!("{gateway:?}");
        assert!(dbg.contains("authenticated: true"));
        assert!(!dbg.contains("hidden-key"));
    }

    #[tokio::test]
    async fn test_map_buffer_error_unboxes_gateway_error() {
        let boxed: tower::BoxError = Box::new(GatewayError::Timeout(Duration::from_secs(5)));
        assert!(matches!(
            map_buffer_error(boxed),
            GatewayError::Timeout(_)
        ));

        let boxed: tower::BoxError = "worker gone".into();
        assert!(matches!(
            map_buffer_error(boxed),
            GatewayError::ServiceClosed
        ));
    }
}
