use crate::config::{ConfigError, GatewayConfig, TlsRootConfig, TransportSecurity};
use crate::credential::Credential;
use crate::diagnostics::{Diagnostics, TracingDiagnostics};
use crate::error::GatewayError;
use crate::gateway::BufferedService;
use crate::layers::{BasicAuthLayer, DefaultHeadersLayer, DiagnosticsLayer};
use crate::response::ResponseBody;
use crate::tls::build_https_connector;
use bytes::Bytes;
use http::Response;
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use std::sync::Arc;
use std::time::Duration;
use tower::buffer::Buffer;
use tower::timeout::TimeoutLayer;
use tower::{ServiceBuilder, ServiceExt};
use tower_http::decompression::DecompressionLayer;
use url::Url;

/// Builder for a [`RequestGateway`](crate::RequestGateway).
pub struct GatewayBuilder {
    config: GatewayConfig,
    credential: Option<Credential>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl GatewayBuilder {
    /// Create a new builder with default configuration and no credential
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(GatewayConfig::default())
    }

    /// Create a builder with a specific configuration
    #[must_use]
    pub fn with_config(config: GatewayConfig) -> Self {
        Self {
            config,
            credential: None,
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    /// Create a builder from the process environment.
    ///
    /// `HEROKU_API_ENDPOINT` overrides the base endpoint and `HEROKU_API_KEY`,
    /// when set, becomes the gateway's credential.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if `HEROKU_API_ENDPOINT` is not a valid base URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = Self::with_config(GatewayConfig::from_env()?);
        builder.credential = Credential::from_env();
        Ok(builder)
    }

    /// Set the base endpoint that relative paths resolve against
    #[must_use]
    pub fn base_url(mut self, base_url: Url) -> Self {
        self.config.base_url = base_url;
        self
    }

    /// Set the per-request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the user agent string
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the maximum response body size
    #[must_use]
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    /// Set transport security mode
    ///
    /// Use `TransportSecurity::AllowInsecureHttp` only for testing with mock servers.
    #[must_use]
    pub fn transport(mut self, transport: TransportSecurity) -> Self {
        self.config.transport = transport;
        self
    }

    /// Allow insecure HTTP connections (for testing only)
    ///
    /// Equivalent to `.transport(TransportSecurity::AllowInsecureHttp)`.
    ///
    /// **WARNING**: the `Authorization` header travels in clear text over plain
    /// HTTP. Only available in debug builds or with the `allow-insecure-http`
    /// feature.
    #[must_use]
    #[cfg(any(debug_assertions, feature = "allow-insecure-http"))]
    pub fn allow_insecure_http(mut self) -> Self {
        tracing::warn!(
            target: "heroku_http::security",
            "allow_insecure_http() called - HTTP traffic will NOT be encrypted"
        );
        self.config.transport = TransportSecurity::AllowInsecureHttp;
        self
    }

    /// Set the TLS root certificate strategy
    #[must_use]
    pub fn tls_roots(mut self, tls_roots: TlsRootConfig) -> Self {
        self.config.tls_roots = tls_roots;
        self
    }

    /// Set the buffer capacity for concurrent request handling
    ///
    /// A capacity of 0 is clamped to 1 (tower's `Buffer` panics on 0).
    #[must_use]
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.config.buffer_capacity = capacity.max(1);
        self
    }

    /// Set the idle connection timeout for the connection pool
    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.pool_idle_timeout = timeout;
        self
    }

    /// Set the maximum number of idle connections per host
    #[must_use]
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.config.pool_max_idle_per_host = max;
        self
    }

    /// Attach a credential to the gateway being built
    #[must_use]
    pub fn credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Replace the default [`TracingDiagnostics`] sink
    #[must_use]
    pub fn diagnostics(mut self, diagnostics: impl Diagnostics) -> Self {
        self.diagnostics = Arc::new(diagnostics);
        self
    }

    /// Build the gateway with all configured layers
    ///
    /// Must be called within a Tokio runtime (the buffer worker is spawned here).
    ///
    /// # Errors
    /// Returns an error if TLS initialization fails or the user agent is not a
    /// valid header value.
    pub fn build(self) -> Result<crate::RequestGateway, GatewayError> {
        if self.config.transport == TransportSecurity::AllowInsecureHttp {
            tracing::warn!(
                "insecure HTTP enabled (TransportSecurity::AllowInsecureHttp); \
                 use only for testing with mock servers"
            );
        }

        let timeout = self.config.request_timeout;
        let https = build_https_connector(self.config.tls_roots, self.config.transport)?;

        let mut client_builder = Client::builder(TokioExecutor::new());
        // pool_idle_timeout has no effect without a pool timer
        client_builder
            .pool_timer(TokioTimer::new())
            .pool_max_idle_per_host(self.config.pool_max_idle_per_host)
            .http2_only(false);
        if let Some(idle_timeout) = self.config.pool_idle_timeout {
            client_builder.pool_idle_timeout(idle_timeout);
        }
        let hyper_client = client_builder.build::<_, Full<Bytes>>(https);

        let headers_layer = DefaultHeadersLayer::try_new(&self.config.user_agent)?;
        let auth = self
            .credential
            .as_ref()
            .map(BasicAuthLayer::try_new)
            .transpose()?;

        // Request flow (outer → inner):
        //   Buffer → Diagnostics → ErrorMapping → Timeout → DefaultHeaders →
        //   Decompression → hyper_client
        //
        // Authorization is applied per gateway instance in front of the buffer
        // (see `RequestBuilder::send`), so clones with different credentials
        // share this stack and its connection pool.
        let service = ServiceBuilder::new()
            .layer(TimeoutLayer::new(timeout))
            .layer(headers_layer)
            .layer(DecompressionLayer::new())
            .service(hyper_client)
            .map_response(map_decompression_response)
            .map_err(move |e: tower::BoxError| map_tower_error(e, timeout))
            .boxed_clone();

        let service = ServiceBuilder::new()
            .layer(DiagnosticsLayer::new(Arc::clone(&self.diagnostics)))
            .service(service);

        let buffered: BufferedService =
            Buffer::new(service, self.config.buffer_capacity.max(1));

        Ok(crate::RequestGateway {
            service: buffered,
            base_url: self.config.base_url,
            credential: self.credential,
            auth,
            max_body_size: self.config.max_body_size,
            transport_security: self.config.transport,
            request_timeout: timeout,
            diagnostics: self.diagnostics,
        })
    }
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Map tower errors to `GatewayError`, turning `Elapsed` into `Timeout(timeout)`.
///
/// A `GatewayError` already boxed by an inner layer is passed through unchanged.
fn map_tower_error(err: tower::BoxError, timeout: Duration) -> GatewayError {
    if err.is::<tower::timeout::error::Elapsed>() {
        return GatewayError::Timeout(timeout);
    }

    match err.downcast::<GatewayError>() {
        Ok(gateway_err) => *gateway_err,
        Err(other) => GatewayError::Transport(other),
    }
}

/// Box the decompression body into [`ResponseBody`].
fn map_decompression_response<B>(response: Response<B>) -> Response<ResponseBody>
where
    B: hyper::body::Body<Data = Bytes> + Send + Sync + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (parts, body) = response.into_parts();
    let boxed_body: ResponseBody = body.map_err(Into::into).boxed();
    Response::from_parts(parts, boxed_body)
}
